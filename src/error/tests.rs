//! Tests for error types.

#[cfg(test)]
mod tests {
    use super::super::*;

    #[test]
    fn test_error_display() {
        let err = Error::config("growth increment cannot be 0");
        assert_eq!(
            err.to_string(),
            "configuration error: growth increment cannot be 0"
        );
    }

    #[test]
    fn test_watcher_error_conversion() {
        let watch_err = WatcherError::WatchFailed {
            path: "/tmp/test".to_string(),
            registered: 3,
            reason: "no space left on device".to_string(),
        };
        let err: Error = watch_err.into();
        assert!(matches!(err, Error::Watcher(_)));
    }

    #[test]
    fn test_watch_failed_mentions_count() {
        let err = WatcherError::WatchFailed {
            path: "/srv/data".to_string(),
            registered: 8192,
            reason: "no space left on device".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to watch path '/srv/data' (8192 watches already added): no space left on device"
        );
    }

    #[test]
    fn test_init_error() {
        let err = WatcherError::init("inotify", "too many open files");
        assert_eq!(
            err.to_string(),
            "failed to initialize inotify: too many open files"
        );
    }

    #[test]
    fn test_growth_error() {
        let err = WatcherError::Growth {
            additional: 32,
            reason: "capacity overflow".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to grow watch table by 32 slots: capacity overflow"
        );
    }

    #[test]
    fn test_walk_error() {
        let err = WatcherError::Walk {
            path: "/root/secret".to_string(),
            reason: "permission denied".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "failed to walk '/root/secret': permission denied"
        );
    }

    #[test]
    fn test_read_error() {
        let err: Error = WatcherError::Read("bad file descriptor".to_string()).into();
        assert_eq!(
            err.to_string(),
            "watcher error: failed to read notifications: bad file descriptor"
        );
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "stdout closed");
        let err: Error = io_err.into();
        assert!(matches!(err, Error::Io(_)));
    }

    #[test]
    fn test_error_propagation_with_question_mark() {
        fn inner() -> Result<i32> {
            Err(WatcherError::Read("inner".to_string()).into())
        }

        fn outer() -> Result<i32> {
            let _ = inner()?;
            Ok(0)
        }

        let result = outer();
        assert!(matches!(result, Err(Error::Watcher(WatcherError::Read(_)))));
    }
}
