#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    lab_report_server::run().await?;
    Ok(())
}
