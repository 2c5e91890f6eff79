//! Checksum validation strategies.
//!
//! Every status line ends with a `chksum` field. The algorithm behind it is not
//! published, so the default strategy accepts every frame. A real check can be
//! plugged into [`Mate`](crate::Mate) without touching the rest of the pipeline.

/// Decides whether a frame's embedded checksum is consistent.
///
/// Receives the frame interior (markers stripped).
pub trait ChecksumValidator: Send {
    /// Returns `true` if the frame should be processed.
    fn verify(&self, frame: &str) -> bool;
}

/// Accepts every frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct AcceptAll;

impl ChecksumValidator for AcceptAll {
    fn verify(&self, _frame: &str) -> bool {
        true
    }
}

impl<F> ChecksumValidator for F
where
    F: Fn(&str) -> bool + Send,
{
    fn verify(&self, frame: &str) -> bool {
        self(frame)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accept_all() {
        assert!(AcceptAll.verify("0,00,00,00"));
        assert!(AcceptAll.verify(""));
    }

    #[test]
    fn test_closure_strategy() {
        let ends_with_zero = |frame: &str| frame.ends_with('0');
        assert!(ends_with_zero.verify("A,10"));
        assert!(!ends_with_zero.verify("A,11"));
    }
}
