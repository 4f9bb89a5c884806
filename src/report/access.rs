//! Document-level access policy applied to the finished report.

use lopdf::{Document, EncryptionState, EncryptionVersion, Object, Permissions, StringFormat};
use sha2::{Digest, Sha256};

use super::ReportError;

/// Owner password of publicly readable reports.
pub const PUBLIC_OWNER_PASSWORD: &str = "OWNER_LOCK";

const KEY_LENGTH: usize = 128;

/// Who may open a generated document.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessPolicy {
    /// Opens without a password.
    Public,
    /// Opens only with the shared instructor secret.
    Privileged { secret: String },
}

impl AccessPolicy {
    /// Privileged only when it was requested and a secret is available.
    /// Surrounding whitespace is not part of the secret.
    pub fn resolve(privileged: bool, secret: &str) -> Self {
        let secret = secret.trim();
        if privileged && !secret.is_empty() {
            Self::Privileged {
                secret: secret.to_string(),
            }
        } else {
            Self::Public
        }
    }

    /// Whether the composition carries the instructor-only section.
    pub fn includes_restricted_section(&self) -> bool {
        matches!(self, Self::Privileged { .. })
    }

    fn passwords(&self) -> (String, String) {
        match self {
            Self::Public => (String::new(), PUBLIC_OWNER_PASSWORD.to_string()),
            Self::Privileged { secret } => (secret.clone(), format!("{}_OWNER", secret)),
        }
    }
}

/// Encrypt the document so it can be printed but not modified, copied or
/// annotated.
///
/// The file identifier is derived from the unencrypted bytes, so the same
/// input and policy always produce the same output.
pub fn apply_access_policy(document: &[u8], policy: &AccessPolicy) -> Result<Vec<u8>, ReportError> {
    let failure = |e: lopdf::Error| ReportError::AccessPolicy(e.to_string());

    let mut doc = Document::load_mem(document).map_err(failure)?;
    if doc.is_encrypted() {
        return Err(ReportError::AccessPolicy("document is already encrypted".to_string()));
    }

    let digest = Sha256::digest(document);
    let id = Object::String(digest[..16].to_vec(), StringFormat::Hexadecimal);
    doc.trailer.set("ID", Object::Array(vec![id.clone(), id]));

    let (user_password, owner_password) = policy.passwords();
    let version = EncryptionVersion::V2 {
        document: &doc,
        owner_password: &owner_password,
        user_password: &user_password,
        key_length: KEY_LENGTH,
        permissions: Permissions::PRINTABLE,
    };
    let state = EncryptionState::try_from(version).map_err(failure)?;
    doc.encrypt(&state).map_err(failure)?;

    let mut bytes = Vec::new();
    doc.save_to(&mut bytes)
        .map_err(|e| ReportError::AccessPolicy(e.to_string()))?;
    log::debug!(
        "applied {} access policy ({} bytes)",
        if policy.includes_restricted_section() { "privileged" } else { "public" },
        bytes.len()
    );
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use lopdf::content::{Content, Operation};
    use lopdf::{Dictionary, Stream};

    fn one_page_pdf() -> Vec<u8> {
        let mut doc = Document::with_version("1.5");
        let pages_id = doc.new_object_id();
        let content = Content {
            operations: vec![
                Operation::new("BT", vec![]),
                Operation::new("Td", vec![72.into(), 720.into()]),
                Operation::new("Tj", vec![Object::string_literal("Restricted")]),
                Operation::new("ET", vec![]),
            ],
        };
        let content_id = doc.add_object(Stream::new(Dictionary::new(), content.encode().unwrap()));
        let page_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Page".to_vec())),
            ("Parent", Object::Reference(pages_id)),
            ("Contents", Object::Reference(content_id)),
            (
                "MediaBox",
                Object::Array(vec![0.into(), 0.into(), 612.into(), 792.into()]),
            ),
        ]));
        doc.objects.insert(
            pages_id,
            Object::Dictionary(Dictionary::from_iter([
                ("Type", Object::Name(b"Pages".to_vec())),
                ("Kids", Object::Array(vec![Object::Reference(page_id)])),
                ("Count", Object::Integer(1)),
            ])),
        );
        let catalog_id = doc.add_object(Dictionary::from_iter([
            ("Type", Object::Name(b"Catalog".to_vec())),
            ("Pages", Object::Reference(pages_id)),
        ]));
        doc.trailer.set("Root", Object::Reference(catalog_id));
        let mut bytes = Vec::new();
        doc.save_to(&mut bytes).unwrap();
        bytes
    }

    fn contains(haystack: &[u8], needle: &[u8]) -> bool {
        haystack.windows(needle.len()).any(|window| window == needle)
    }

    #[test]
    fn test_resolve() {
        assert_eq!(AccessPolicy::resolve(false, "secret"), AccessPolicy::Public);
        assert_eq!(AccessPolicy::resolve(true, ""), AccessPolicy::Public);
        assert_eq!(AccessPolicy::resolve(true, "   "), AccessPolicy::Public);
        let policy = AccessPolicy::resolve(true, " secret\t");
        assert_eq!(
            policy,
            AccessPolicy::Privileged {
                secret: "secret".to_string()
            }
        );
        assert!(policy.includes_restricted_section());
        assert!(!AccessPolicy::Public.includes_restricted_section());
    }

    #[test]
    fn test_passwords() {
        assert_eq!(
            AccessPolicy::Public.passwords(),
            (String::new(), "OWNER_LOCK".to_string())
        );
        let policy = AccessPolicy::Privileged {
            secret: "s3cret".to_string(),
        };
        assert_eq!(policy.passwords(), ("s3cret".to_string(), "s3cret_OWNER".to_string()));
    }

    #[test]
    fn test_output_is_encrypted() {
        let plain = one_page_pdf();
        assert!(contains(&plain, b"Restricted"));

        let protected = apply_access_policy(&plain, &AccessPolicy::Public).unwrap();
        assert!(contains(&protected, b"/Encrypt"));
        assert!(!contains(&protected, b"(Restricted)"));
    }

    #[test]
    fn test_policies_produce_different_documents() {
        let plain = one_page_pdf();
        let public = apply_access_policy(&plain, &AccessPolicy::Public).unwrap();
        let privileged = apply_access_policy(
            &plain,
            &AccessPolicy::Privileged {
                secret: "s3cret".to_string(),
            },
        )
        .unwrap();
        assert_ne!(public, privileged);
    }

    #[test]
    fn test_deterministic() {
        let plain = one_page_pdf();
        let policy = AccessPolicy::Privileged {
            secret: "s3cret".to_string(),
        };
        let first = apply_access_policy(&plain, &policy).unwrap();
        let second = apply_access_policy(&plain, &policy).unwrap();
        assert_eq!(first, second);
    }

    fn permissions(bytes: &[u8]) -> i64 {
        let pattern = regex::bytes::Regex::new(r"/P\s*(-?\d+)").unwrap();
        let captures = pattern.captures(bytes).expect("encryption dictionary carries /P");
        std::str::from_utf8(&captures[1]).unwrap().parse().unwrap()
    }

    fn page_content(doc: &Document) -> Vec<u8> {
        let page_id = *doc.get_pages().values().next().unwrap();
        doc.get_page_content(page_id).unwrap()
    }

    #[test]
    fn test_public_output_opens_without_password() {
        let protected = apply_access_policy(&one_page_pdf(), &AccessPolicy::Public).unwrap();
        let mut doc = Document::load_mem(&protected).unwrap();
        if doc.is_encrypted() {
            assert!(doc.authenticate_user_password("").is_ok());
            doc.decrypt("").unwrap();
        }
        assert!(contains(&page_content(&doc), b"Restricted"));
    }

    #[test]
    fn test_privileged_output_needs_secret() {
        let policy = AccessPolicy::Privileged {
            secret: "s3cret".to_string(),
        };
        let protected = apply_access_policy(&one_page_pdf(), &policy).unwrap();
        let mut doc = Document::load_mem(&protected).unwrap();

        assert!(doc.is_encrypted());
        assert!(doc.authenticate_user_password("").is_err());
        assert!(doc.authenticate_user_password("wrong").is_err());
        assert!(doc.authenticate_user_password("s3cret").is_ok());
        assert!(doc.authenticate_owner_password("s3cret_OWNER").is_ok());

        doc.decrypt("s3cret").unwrap();
        assert!(contains(&page_content(&doc), b"Restricted"));
    }

    #[test]
    fn test_permissions_allow_print_only() {
        for policy in [
            AccessPolicy::Public,
            AccessPolicy::Privileged {
                secret: "s3cret".to_string(),
            },
        ] {
            let protected = apply_access_policy(&one_page_pdf(), &policy).unwrap();
            let p = permissions(&protected);
            assert_ne!(p & 4, 0, "print allowed");
            assert_eq!(p & 8, 0, "modify blocked");
            assert_eq!(p & 16, 0, "copy blocked");
            assert_eq!(p & 32, 0, "annotate blocked");
        }
    }

    #[test]
    fn test_rejects_garbage() {
        let err = apply_access_policy(b"not a pdf", &AccessPolicy::Public).unwrap_err();
        assert!(matches!(err, ReportError::AccessPolicy(_)));
        assert!(!err.is_client_error());
    }
}
