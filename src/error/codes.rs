#[repr(i32)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExitCode {
    Success = 0,
    GeneralError = 1,
    InvalidArguments = 2,
    TargetFolderMissing = 3,
    AlreadyLocked = 4,
    PermissionError = 5,
    SessionError = 6,
    CorruptSession = 7,
    DatabaseError = 8,
    ConfigError = 9,
    IoError = 10,
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_exit_code_values() {
        assert_eq!(ExitCode::Success as i32, 0);
        assert_eq!(ExitCode::GeneralError as i32, 1);
        assert_eq!(ExitCode::InvalidArguments as i32, 2);
        assert_eq!(ExitCode::TargetFolderMissing as i32, 3);
        assert_eq!(ExitCode::AlreadyLocked as i32, 4);
        assert_eq!(ExitCode::PermissionError as i32, 5);
        assert_eq!(ExitCode::SessionError as i32, 6);
        assert_eq!(ExitCode::CorruptSession as i32, 7);
        assert_eq!(ExitCode::DatabaseError as i32, 8);
        assert_eq!(ExitCode::ConfigError as i32, 9);
        assert_eq!(ExitCode::IoError as i32, 10);
    }

    #[test]
    fn test_exit_code_into_i32() {
        let code: i32 = ExitCode::AlreadyLocked.into();
        assert_eq!(code, 4);
    }
}
