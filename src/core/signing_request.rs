/*
 * The immutable snapshot of the signing form. It is built once per
 * invocation from the UI state and handed by value to the synthesizer, so
 * validation and argument building never touch widgets.
 *
 * Path and text fields hold trimmed user input; an empty string means
 * "not set". The password is kept exactly as typed.
 */
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SigningRequest {
    pub input_path: String,
    pub adhoc: bool,
    pub certificate_path: String,
    pub password: String,
    pub provisioning_profile_path: String,
    pub output_path: String,
    pub extra_certificate_path: String,
    pub bundle_id: String,
    pub bundle_name: String,
    pub bundle_version: String,
    pub entitlements_path: String,
    pub dylib_path: String,
    pub weak_dylib: bool,
    pub force: bool,
    pub sha256_only: bool,
    pub install_after_sign: bool,
    // Raw text of the compression field; only 0..=9 is forwarded.
    pub zip_level: String,
}

pub const DEFAULT_ZIP_LEVEL: &str = "9";

impl SigningRequest {
    // Parses the compression field. Anything that is not an integer in 0..=9 is ignored.
    pub fn parsed_zip_level(&self) -> Option<u8> {
        self.zip_level
            .trim()
            .parse::<i32>()
            .ok()
            .and_then(|level| u8::try_from(level).ok())
            .filter(|level| *level <= 9)
    }
}
