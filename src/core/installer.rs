/*
 * Fixed invocations of the device installer. The installer reports a
 * missing or unpaired device by printing a line containing `ERROR:`, on
 * either stream depending on its version, rather than through its exit code.
 */
use crate::core::process_runner::{CapturedOutput, ProcessInvocation};
use std::path::Path;

const NO_DEVICE_MARKER: &str = "ERROR:";

pub fn device_probe_invocation(installer: &Path) -> ProcessInvocation {
    ProcessInvocation::new(installer, vec!["-l".to_string()])
}

pub fn install_invocation(installer: &Path, signed_app: &Path) -> ProcessInvocation {
    ProcessInvocation::new(
        installer,
        vec!["-i".to_string(), signed_app.to_string_lossy().into_owned()],
    )
}

pub fn device_present(probe: &CapturedOutput) -> bool {
    !(probe.stdout.contains(NO_DEVICE_MARKER) || probe.stderr.contains(NO_DEVICE_MARKER))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;

    fn probe(stdout: &str, stderr: &str) -> CapturedOutput {
        CapturedOutput {
            stdout: stdout.to_string(),
            stderr: stderr.to_string(),
            exit_code: Some(0),
        }
    }

    #[test]
    fn test_device_present_when_no_error_marker() {
        assert!(device_present(&probe("Total: 3 apps\ncom.example.app\n", "")));
        assert!(device_present(&probe("", "")));
    }

    #[test]
    fn test_error_marker_on_either_stream_means_no_device() {
        assert!(!device_present(&probe("ERROR: Device not found\n", "")));
        assert!(!device_present(&probe("", "ERROR: Could not connect to lockdownd\n")));
    }

    #[test]
    fn test_invocations() {
        // Arrange
        let installer = PathBuf::from("/usr/local/bin/ideviceinstaller");
        let app = PathBuf::from("/tmp/out/signed.ipa");

        // Act
        let list = device_probe_invocation(&installer);
        let install = install_invocation(&installer, &app);

        // Assert
        assert_eq!(list.program, installer);
        assert_eq!(list.args, vec!["-l"]);
        assert_eq!(install.args, vec!["-i", "/tmp/out/signed.ipa"]);
    }
}
