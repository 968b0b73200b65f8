//! Decode policies for `deserialize`.
//!
//! Decoding never runs validators on its own. The policy decides whether the
//! reader follows a successful decode with a full message validation.

/// What `deserialize` does after a frame decodes successfully.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DecodePolicy {
    /// Run every field chain and the message rules; invalid data is an error.
    #[default]
    Validate,
    /// Hand the decoded message back as-is. Callers must validate before use.
    Trust,
}

impl DecodePolicy {
    #[inline(always)]
    pub fn validates(self) -> bool {
        matches!(self, DecodePolicy::Validate)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_policy_validates() {
        assert_eq!(DecodePolicy::default(), DecodePolicy::Validate);
        assert!(DecodePolicy::default().validates());
        assert!(!DecodePolicy::Trust.validates());
    }
}
