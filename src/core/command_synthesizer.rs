/*
 * Turns a `SigningRequest` into the argument vector for the re-signing tool.
 *
 * Validation is fail-fast in a fixed order: input, then certificate and
 * provisioning profile (unless ad-hoc), then the optional path fields in
 * flag order, and finally creation of the output directory. The emitted
 * tokens follow a fixed order because the tool is sensitive to it; the input
 * path is always the last, flag-less token.
 */
use crate::core::signing_request::SigningRequest;
use std::fs;
use std::io;
use std::path::Path;

#[derive(Debug)]
pub enum ValidationError {
    MissingInput,
    InputNotFound(String),
    MissingCertificate,
    MissingProvisioningProfile,
    CertificateNotFound(String),
    ProvisioningProfileNotFound(String),
    ExtraCertificateNotFound(String),
    EntitlementsNotFound(String),
    DylibNotFound(String),
    OutputDirectoryCreation(io::Error),
}

impl std::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ValidationError::MissingInput => write!(f, "Unsigned app (.ipa) is required."),
            ValidationError::InputNotFound(p) => write!(f, "Input path does not exist: {p}"),
            ValidationError::MissingCertificate => {
                write!(f, "Certificate file (.p12) is required unless using ad-hoc.")
            }
            ValidationError::MissingProvisioningProfile => {
                write!(f, "Provisioning profile is required unless using ad-hoc.")
            }
            ValidationError::CertificateNotFound(p) => {
                write!(f, "Certificate file not found: {p}")
            }
            ValidationError::ProvisioningProfileNotFound(p) => {
                write!(f, "Provisioning profile not found: {p}")
            }
            ValidationError::ExtraCertificateNotFound(p) => {
                write!(f, "Certificate file not found: {p}")
            }
            ValidationError::EntitlementsNotFound(p) => {
                write!(f, "Entitlements file not found: {p}")
            }
            ValidationError::DylibNotFound(p) => write!(f, "Dylib file not found: {p}"),
            ValidationError::OutputDirectoryCreation(e) => {
                write!(f, "Could not create output directory: {e}")
            }
        }
    }
}

impl std::error::Error for ValidationError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ValidationError::OutputDirectoryCreation(e) => Some(e),
            _ => None,
        }
    }
}

pub type Result<T> = std::result::Result<T, ValidationError>;

fn exists(path: &str) -> bool {
    Path::new(path).exists()
}

// An optional path is fine when empty; when set it must exist.
fn check_optional(path: &str, error: fn(String) -> ValidationError) -> Result<()> {
    if !path.is_empty() && !exists(path) {
        return Err(error(path.to_string()));
    }
    Ok(())
}

fn validate(request: &SigningRequest) -> Result<()> {
    if request.input_path.is_empty() {
        return Err(ValidationError::MissingInput);
    }
    if !exists(&request.input_path) {
        return Err(ValidationError::InputNotFound(request.input_path.clone()));
    }

    if !request.adhoc {
        if request.certificate_path.is_empty() {
            return Err(ValidationError::MissingCertificate);
        }
        if request.provisioning_profile_path.is_empty() {
            return Err(ValidationError::MissingProvisioningProfile);
        }
        if !exists(&request.certificate_path) {
            return Err(ValidationError::CertificateNotFound(
                request.certificate_path.clone(),
            ));
        }
        if !exists(&request.provisioning_profile_path) {
            return Err(ValidationError::ProvisioningProfileNotFound(
                request.provisioning_profile_path.clone(),
            ));
        }
    }

    check_optional(
        &request.extra_certificate_path,
        ValidationError::ExtraCertificateNotFound,
    )?;
    check_optional(&request.entitlements_path, ValidationError::EntitlementsNotFound)?;
    check_optional(&request.dylib_path, ValidationError::DylibNotFound)?;
    Ok(())
}

fn ensure_output_directory(output_path: &str) -> Result<()> {
    let Some(parent) = Path::new(output_path).parent() else {
        return Ok(());
    };
    if parent.as_os_str().is_empty() || parent.exists() {
        return Ok(());
    }
    log::info!("CommandSynthesizer: Creating output directory {parent:?}");
    fs::create_dir_all(parent).map_err(ValidationError::OutputDirectoryCreation)
}

fn push_pair(args: &mut Vec<String>, flag: &str, value: &str) {
    if !value.is_empty() {
        args.push(flag.to_string());
        args.push(value.to_string());
    }
}

fn push_flag(args: &mut Vec<String>, flag: &str, enabled: bool) {
    if enabled {
        args.push(flag.to_string());
    }
}

/*
 * Validates the request and builds the argument vector (without the program
 * path). Ad-hoc requests never carry `-k`, `-m` or `-p`, whatever the form
 * holds. `-w` follows its own checkbox and is not coupled to `-l`.
 */
pub fn synthesize(request: &SigningRequest) -> Result<Vec<String>> {
    validate(request)?;
    if !request.output_path.is_empty() {
        ensure_output_directory(&request.output_path)?;
    }

    let mut args = Vec::new();
    if request.adhoc {
        args.push("-a".to_string());
    } else {
        push_pair(&mut args, "-k", &request.certificate_path);
        push_pair(&mut args, "-m", &request.provisioning_profile_path);
        push_pair(&mut args, "-p", &request.password);
    }
    push_pair(&mut args, "-o", &request.output_path);
    push_pair(&mut args, "-c", &request.extra_certificate_path);
    push_pair(&mut args, "-b", &request.bundle_id);
    push_pair(&mut args, "-n", &request.bundle_name);
    push_pair(&mut args, "-r", &request.bundle_version);
    push_pair(&mut args, "-e", &request.entitlements_path);
    push_pair(&mut args, "-l", &request.dylib_path);
    push_flag(&mut args, "-w", request.weak_dylib);
    push_flag(&mut args, "-f", request.force);
    push_flag(&mut args, "-2", request.sha256_only);
    push_flag(&mut args, "-i", request.install_after_sign);
    if let Some(level) = request.parsed_zip_level() {
        args.push("-z".to_string());
        args.push(level.to_string());
    }
    args.push(request.input_path.clone());

    log::debug!("CommandSynthesizer: Built {} argument(s).", args.len());
    Ok(args)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::{TempDir, tempdir};

    struct Fixture {
        dir: TempDir,
    }

    impl Fixture {
        fn new() -> Self {
            Fixture {
                dir: tempdir().unwrap(),
            }
        }

        fn file(&self, name: &str) -> String {
            let path = self.dir.path().join(name);
            fs::write(&path, b"fixture").unwrap();
            path.to_string_lossy().into_owned()
        }

        fn missing(&self, name: &str) -> String {
            self.dir.path().join(name).to_string_lossy().into_owned()
        }

        fn adhoc_request(&self) -> SigningRequest {
            SigningRequest {
                input_path: self.file("app.ipa"),
                adhoc: true,
                ..Default::default()
            }
        }

        fn certificate_request(&self) -> SigningRequest {
            SigningRequest {
                input_path: self.file("app.ipa"),
                adhoc: false,
                certificate_path: self.file("dev.p12"),
                provisioning_profile_path: self.file("dev.mobileprovision"),
                ..Default::default()
            }
        }
    }

    fn has_flag(args: &[String], flag: &str) -> bool {
        args.iter().any(|a| a == flag)
    }

    #[test]
    fn test_adhoc_with_output_ends_with_expected_tokens() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.adhoc_request();
        let output = fx.missing("signed.ipa");
        request.output_path = output.clone();
        request.zip_level = String::new();

        // Act
        let args = synthesize(&request).unwrap();

        // Assert
        assert_eq!(args, vec!["-a".to_string(), "-o".into(), output, request.input_path]);
    }

    #[test]
    fn test_adhoc_never_emits_certificate_flags() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.adhoc_request();
        request.certificate_path = fx.file("dev.p12");
        request.provisioning_profile_path = fx.missing("missing.mobileprovision");
        request.password = "hunter2".into();

        // Act
        let args = synthesize(&request).unwrap();

        // Assert
        assert!(!has_flag(&args, "-k"));
        assert!(!has_flag(&args, "-m"));
        assert!(!has_flag(&args, "-p"));
        assert!(!has_flag(&args, "hunter2"));
    }

    #[test]
    fn test_certificate_mode_emits_k_m_p_in_order() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.certificate_request();
        request.password = "pw with space".into();

        // Act
        let args = synthesize(&request).unwrap();

        // Assert
        assert_eq!(
            &args[..6],
            &[
                "-k".to_string(),
                request.certificate_path.clone(),
                "-m".into(),
                request.provisioning_profile_path.clone(),
                "-p".into(),
                "pw with space".into()
            ]
        );
        assert_eq!(args.last(), Some(&request.input_path));
    }

    #[test]
    fn test_empty_password_omits_p() {
        let fx = Fixture::new();
        let args = synthesize(&fx.certificate_request()).unwrap();
        assert!(!has_flag(&args, "-p"));
        assert!(has_flag(&args, "-k"));
    }

    #[test]
    fn test_missing_input_fails_first() {
        // Arrange
        let request = SigningRequest::default();

        // Act
        let err = synthesize(&request).unwrap_err();

        // Assert
        assert!(matches!(err, ValidationError::MissingInput));
        assert_eq!(err.to_string(), "Unsigned app (.ipa) is required.");
    }

    #[test]
    fn test_nonexistent_input_fails() {
        let fx = Fixture::new();
        let request = SigningRequest {
            input_path: fx.missing("ghost.ipa"),
            adhoc: true,
            ..Default::default()
        };
        let err = synthesize(&request).unwrap_err();
        assert!(matches!(err, ValidationError::InputNotFound(_)));
        assert!(err.to_string().starts_with("Input path does not exist: "));
    }

    #[test]
    fn test_non_adhoc_requires_certificate_then_profile() {
        // Arrange
        let fx = Fixture::new();
        let mut no_cert = fx.certificate_request();
        no_cert.certificate_path.clear();
        no_cert.provisioning_profile_path.clear();
        let mut no_prov = fx.certificate_request();
        no_prov.provisioning_profile_path.clear();

        // Act & Assert
        assert!(matches!(
            synthesize(&no_cert).unwrap_err(),
            ValidationError::MissingCertificate
        ));
        assert!(matches!(
            synthesize(&no_prov).unwrap_err(),
            ValidationError::MissingProvisioningProfile
        ));
    }

    #[test]
    fn test_non_adhoc_with_missing_certificate_file_fails() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.certificate_request();
        request.certificate_path = fx.missing("missing.p12");

        // Act
        let err = synthesize(&request).unwrap_err();

        // Assert
        assert!(matches!(err, ValidationError::CertificateNotFound(ref p) if p.ends_with("missing.p12")));
    }

    #[test]
    fn test_non_adhoc_with_missing_profile_file_fails() {
        let fx = Fixture::new();
        let mut request = fx.certificate_request();
        request.provisioning_profile_path = fx.missing("gone.mobileprovision");
        assert!(matches!(
            synthesize(&request).unwrap_err(),
            ValidationError::ProvisioningProfileNotFound(_)
        ));
    }

    #[test]
    fn test_empty_optional_paths_are_omitted() {
        // Arrange
        let fx = Fixture::new();
        let request = fx.adhoc_request();

        // Act
        let args = synthesize(&request).unwrap();

        // Assert
        for flag in ["-o", "-c", "-e", "-l", "-b", "-n", "-r"] {
            assert!(!has_flag(&args, flag), "{flag} should be absent");
        }
    }

    #[test]
    fn test_populated_but_missing_optional_paths_fail_in_order() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.adhoc_request();
        request.extra_certificate_path = fx.missing("extra.pem");
        request.entitlements_path = fx.missing("ent.plist");
        request.dylib_path = fx.missing("hook.dylib");

        // Act & Assert
        assert!(matches!(
            synthesize(&request).unwrap_err(),
            ValidationError::ExtraCertificateNotFound(_)
        ));
        request.extra_certificate_path.clear();
        assert!(matches!(
            synthesize(&request).unwrap_err(),
            ValidationError::EntitlementsNotFound(_)
        ));
        request.entitlements_path.clear();
        let err = synthesize(&request).unwrap_err();
        assert!(matches!(err, ValidationError::DylibNotFound(_)));
        assert!(err.to_string().starts_with("Dylib file not found: "));
    }

    #[test]
    fn test_validation_failure_does_not_create_output_directory() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.adhoc_request();
        let out_dir = fx.dir.path().join("never");
        request.output_path = out_dir.join("signed.ipa").to_string_lossy().into_owned();
        request.dylib_path = fx.missing("hook.dylib");

        // Act
        let result = synthesize(&request);

        // Assert
        assert!(result.is_err());
        assert!(!out_dir.exists());
    }

    #[test]
    fn test_output_parent_directories_are_created() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.adhoc_request();
        let nested: PathBuf = fx.dir.path().join("a").join("b").join("c");
        request.output_path = nested.join("signed.ipa").to_string_lossy().into_owned();

        // Act
        let args = synthesize(&request).unwrap();

        // Assert
        assert!(nested.is_dir());
        assert!(has_flag(&args, "-o"));
    }

    #[test]
    fn test_output_directory_creation_failure_is_validation_error() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.adhoc_request();
        let blocker = fx.file("blocker");
        request.output_path = Path::new(&blocker)
            .join("sub")
            .join("signed.ipa")
            .to_string_lossy()
            .into_owned();

        // Act
        let err = synthesize(&request).unwrap_err();

        // Assert
        assert!(matches!(err, ValidationError::OutputDirectoryCreation(_)));
        assert!(err.to_string().starts_with("Could not create output directory: "));
    }

    #[test]
    fn test_full_flag_table_order() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.certificate_request();
        request.password = "pw".into();
        request.output_path = fx.missing("out.ipa");
        request.extra_certificate_path = fx.file("extra.pem");
        request.bundle_id = "com.example.app".into();
        request.bundle_name = "Example".into();
        request.bundle_version = "1.2.3".into();
        request.entitlements_path = fx.file("ent.plist");
        request.dylib_path = fx.file("hook.dylib");
        request.weak_dylib = true;
        request.force = true;
        request.sha256_only = true;
        request.install_after_sign = true;
        request.zip_level = "9".into();

        // Act
        let args = synthesize(&request).unwrap();

        // Assert
        let flags: Vec<&str> = args
            .iter()
            .map(String::as_str)
            .filter(|a| a.starts_with('-'))
            .collect();
        assert_eq!(
            flags,
            vec![
                "-k", "-m", "-p", "-o", "-c", "-b", "-n", "-r", "-e", "-l", "-w", "-f", "-2",
                "-i", "-z"
            ]
        );
        let z = args.iter().position(|a| a == "-z").unwrap();
        assert_eq!(args[z + 1], "9");
        assert_eq!(args.last(), Some(&request.input_path));
    }

    #[test]
    fn test_weak_flag_is_independent_of_dylib() {
        let fx = Fixture::new();
        let mut request = fx.adhoc_request();
        request.weak_dylib = true;
        let args = synthesize(&request).unwrap();
        assert!(has_flag(&args, "-w"));
        assert!(!has_flag(&args, "-l"));
    }

    #[test]
    fn test_zip_level_out_of_range_or_garbage_is_omitted() {
        // Arrange
        let fx = Fixture::new();
        let mut request = fx.adhoc_request();

        for (level, expected) in [("9", true), ("0", true), ("15", false), ("abc", false)] {
            request.zip_level = level.to_string();

            // Act
            let args = synthesize(&request).unwrap();

            // Assert
            assert_eq!(has_flag(&args, "-z"), expected, "zip level {level:?}");
            if expected {
                let z = args.iter().position(|a| a == "-z").unwrap();
                assert_eq!(args[z + 1], level);
            }
        }
    }

    #[test]
    fn test_directory_input_is_accepted() {
        // Arrange
        let fx = Fixture::new();
        let bundle = fx.dir.path().join("Example.app");
        fs::create_dir(&bundle).unwrap();
        let request = SigningRequest {
            input_path: bundle.to_string_lossy().into_owned(),
            adhoc: true,
            ..Default::default()
        };

        // Act
        let args = synthesize(&request).unwrap();

        // Assert
        assert_eq!(args, vec!["-a".to_string(), request.input_path.clone()]);
    }
}
