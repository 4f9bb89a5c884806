//! Fixed narrative pages: objective, theory, equipment and procedure.

use std::path::Path;

use super::common::static_asset;
use super::layout::{LayoutConfig, INCH};
use super::render::{Block, Figure, ImageRegistry};

/// Illustration loaded from the static asset directory, skipped when absent
/// or unreadable.
struct NarrativeFigure {
    file: &'static str,
    height: f32,
    caption: &'static str,
}

const METRIC_RULER: NarrativeFigure = NarrativeFigure {
    file: "metric_ruler.jpg",
    height: 2.35 * INCH,
    caption: "Figure 1 - Standard metric ruler.",
};

const VERNIER_JAWS: NarrativeFigure = NarrativeFigure {
    file: "vernier_page4.jpg",
    height: 4.65 * INCH,
    caption: "Figure 2 - Vernier calipers (jaws and main scale).",
};

const VERNIER_READING: NarrativeFigure = NarrativeFigure {
    file: "vernier_page5.jpg",
    height: 5.30 * INCH,
    caption: "Figure 3 - Vernier caliper example reading (4.446 cm \u{b1} 0.001 cm).",
};

const MICROMETER_FIRST: NarrativeFigure = NarrativeFigure {
    file: "micrometer_1.jpg",
    height: 2.55 * INCH,
    caption: "Figure 4 - Micrometer example reading (Example 1).",
};

const MICROMETER_SECOND: NarrativeFigure = NarrativeFigure {
    file: "micrometer_2.jpg",
    height: 2.55 * INCH,
    caption: "Figure 5 - Micrometer example reading (Example 2).",
};

const OBJECTIVE: &str = "1. To learn how to use the following measuring devices and understand the \
uncertainties associated with them.
a) meter stick
b) metric ruler
c) triple-beam balance
d) digital balance
e) vernier calipers
f) micrometer

2. Use the following general error propagation equation to analyze the errors involved in making \
calculations involving measurements with their own uncertainty.
";

const PROPAGATION_FORMULA: &str =
    "\u{3c3}f = \u{221a}( (\u{2202}f/\u{2202}x)\u{b2} \u{3c3}x\u{b2} + (\u{2202}f/\u{2202}y)\u{b2} \u{3c3}y\u{b2} + (\u{2202}f/\u{2202}z)\u{b2} \u{3c3}z\u{b2} )";

const METRIC_RULER_TEXT: &str = "Consider the following standard metric ruler.

The ruler is incremented in units of centimeters (cm). The smallest scale division is a tenth of a \
centimeter or 1 mm. Therefore, the uncertainty \u{394}x = smallest increment/2 = 1 mm/2 = 0.5 mm = \
0.05 cm. Note that a measurement made with this ruler must be stated to a tenth of a centimeter, \
since the uncertainty is stated to a tenth of a centimeter. In the example above, the length of the \
object would be stated as x = 2.77 cm \u{b1} 0.05 cm.";

const VERNIER_TEXT: &str = "The Vernier caliper is an instrument that allows you measure lengths \
much more accurate than the metric ruler. The smallest increment in the vernier caliper you will be \
using is (1/50)mm = 0.02mm = 0.002cm. Thus, the uncertainty is \u{394}x = (1/2)0.002 cm = 0.001 cm.";

const VERNIER_EXAMPLE_TEXT: &str = "Note that the zero line on the vernier scale falls between the \
4.4 cm and 4.5 cm mark on the main scale. Thus, the first significant digits are 4.4 cm. The \
remaining two digits are obtained by noting which line on the vernier scale (0,2,4,6,8) coincides \
best with a line on the main scale. Looking closely at the picture below indicates that the 46 line \
lines up the closest. Therefore, the reading is 4.446 cm. Or in standard form 4.446 cm \u{b1} 0.001 cm";

const MICROMETER_TEXT: &str = "The micrometer caliper has a linear scale engraved on its sleeve and \
a circular scale engraved on the thimble. The linear (sleeve) scale is divided into 1 mm divisions \
and is 25 mm long. Half-millimeter (0.5 mm) marks are provided below the main scale.

The circular (thimble) scale has 50 divisions. One complete revolution of the thimble advances it by \
0.5 mm along the linear scale. Therefore, each division on the thimble corresponds to 0.01 mm.

In Figure 5, the main scale is marked with 0 and 5, which indicate millimeters. The marks below the \
main scale indicate half-millimeter increments, since one full rotation of the thimble advances the \
spindle by 0.5 mm.

In the example shown in Figure 5, the half-millimeter mark to the right of the sixth main-scale mark \
is visible. Thus, the reading is between 6.5 mm and 7.0 mm. The thimble scale aligns near the 41st \
division, corresponding to 0.41 mm. By estimating one additional digit, the reading can be refined \
by 0.002 mm.

Therefore, the micrometer reading is 6.5 mm + 0.41 mm + 0.002 mm = 6.912 mm. Converting to meters, \
6.912 mm = 6.912 \u{d7} 10^-3 m. This demonstrates that micrometer measurements can be estimated to \
the nearest thousandth of a millimeter (0.001 mm).";

const EQUIPMENT: &str = "1. one aluminum block
2. meter stick
3. metric ruler
4. triple-beam balance
5. digital balance
6. vernier calipers
7. micrometer";

const PROCEDURE_NOTE: &str = "(for this lab any measurements and calculations should be stated in \
the standard form of:
measurement = x_best \u{b1} \u{394}x)";

const PART_ONE_STEPS: &str = "1. Learn to use all the measuring devices listed above.
2. Calculate the uncertainties of all measuring devices you will be using.";

fn push_figure(
    story: &mut Vec<Block>,
    layout: &LayoutConfig,
    images: &mut ImageRegistry,
    static_dir: &Path,
    figure: &NarrativeFigure,
) -> bool {
    let path = static_asset(static_dir, figure.file);
    if !path.is_file() {
        log::debug!("narrative figure {} not found, skipped", path.display());
        return false;
    }
    if let Err(e) = images.register(&path) {
        log::warn!("skipping unreadable figure {}: {}", path.display(), e);
        return false;
    }
    story.push(Block::Figure(Figure {
        path,
        width: layout.figure_width,
        height: figure.height,
        border: None,
    }));
    story.push(layout.caption(figure.caption));
    true
}

/// Objective page.
pub fn objective(layout: &LayoutConfig) -> Vec<Block> {
    vec![
        layout.heading1("OBJECTIVE"),
        Block::Spacer(0.10 * INCH),
        layout.body(OBJECTIVE),
        layout.body_bold(PROPAGATION_FORMULA),
        Block::PageBreak,
    ]
}

/// Theory pages with the instrument illustrations that are available.
///
/// Figures are registered up front so a broken asset is dropped here
/// instead of failing the render.
pub fn theory(layout: &LayoutConfig, images: &mut ImageRegistry, static_dir: &Path) -> Vec<Block> {
    let mut story = vec![
        layout.heading1("THEORY"),
        layout.body("Refer to lab handout on Error Propagation."),
        Block::Spacer(0.10 * INCH),
        layout.body_bold("Using the Metric Ruler"),
        Block::Spacer(0.06 * INCH),
        layout.small(METRIC_RULER_TEXT),
        Block::Spacer(0.12 * INCH),
    ];
    push_figure(&mut story, layout, images, static_dir, &METRIC_RULER);
    story.push(Block::PageBreak);

    story.push(layout.body_bold("Using the Vernier Calipers"));
    story.push(Block::Spacer(0.08 * INCH));
    story.push(layout.small(VERNIER_TEXT));
    story.push(Block::Spacer(0.12 * INCH));
    push_figure(&mut story, layout, images, static_dir, &VERNIER_JAWS);
    story.push(Block::PageBreak);

    story.push(layout.small(VERNIER_EXAMPLE_TEXT));
    story.push(Block::Spacer(0.12 * INCH));
    push_figure(&mut story, layout, images, static_dir, &VERNIER_READING);
    story.push(Block::PageBreak);

    story.push(layout.body_bold("Using The Micrometer Caliper"));
    story.push(Block::Spacer(0.08 * INCH));
    story.push(layout.small(MICROMETER_TEXT));
    story.push(Block::Spacer(0.08 * INCH));
    if push_figure(&mut story, layout, images, static_dir, &MICROMETER_FIRST) {
        story.push(Block::Spacer(0.08 * INCH));
    }
    push_figure(&mut story, layout, images, static_dir, &MICROMETER_SECOND);
    story.push(Block::PageBreak);

    story
}

/// Equipment list and the procedure introduction, up to the Part I table.
pub fn equipment_and_procedure(layout: &LayoutConfig) -> Vec<Block> {
    vec![
        layout.heading1("EQUIPMENT"),
        layout.body(EQUIPMENT),
        Block::Spacer(0.12 * INCH),
        layout.heading1("PROCEDURE"),
        layout.body(PROCEDURE_NOTE),
        Block::Spacer(0.12 * INCH),
        layout.heading2("Part I (Using Measuring Devices)"),
        layout.body(PART_ONE_STEPS),
        Block::Spacer(0.08 * INCH),
        layout.body_bold("Results :"),
    ]
}
