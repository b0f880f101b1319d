//! Content fingerprints for generated artifacts.

use sha2::{Digest, Sha256};

/// A hasher for building fingerprints from multiple components.
///
/// Components are separated so that `["ab", "c"]` and `["a", "bc"]` hash
/// differently.
#[derive(Default)]
pub struct Fingerprint {
    hasher: Sha256,
}

impl Fingerprint {
    pub fn new() -> Self {
        Fingerprint {
            hasher: Sha256::new(),
        }
    }

    /// Add a string component.
    pub fn update_str(&mut self, s: &str) -> &mut Self {
        self.hasher.update(s.as_bytes());
        self.hasher.update(b"\0");
        self
    }

    /// Add a sequence of strings, length-prefixed.
    pub fn update_strs<'a>(&mut self, items: impl IntoIterator<Item = &'a str>) -> &mut Self {
        let items: Vec<&str> = items.into_iter().collect();
        self.update_str(&items.len().to_string());
        for s in items {
            self.update_str(s);
        }
        self
    }

    /// Add an optional string component.
    pub fn update_opt(&mut self, opt: Option<&str>) -> &mut Self {
        match opt {
            Some(s) => {
                self.hasher.update(b"\x01");
                self.update_str(s);
            }
            None => {
                self.hasher.update(b"\x00");
            }
        }
        self
    }

    /// Add a boolean component.
    pub fn update_bool(&mut self, b: bool) -> &mut Self {
        self.hasher.update([b as u8]);
        self
    }

    /// Finalize and return the fingerprint as a hex string.
    pub fn finish(self) -> String {
        hex::encode(self.hasher.finalize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fingerprint_separates_components() {
        let a = {
            let mut fp = Fingerprint::new();
            fp.update_strs(["camera", "CameraModule"]);
            fp.finish()
        };
        let b = {
            let mut fp = Fingerprint::new();
            fp.update_strs(["cameraCamera", "Module"]);
            fp.finish()
        };
        let c = {
            let mut fp = Fingerprint::new();
            fp.update_strs(["camera", "CameraModule"]);
            fp.finish()
        };

        assert_ne!(a, b);
        assert_eq!(a, c);
    }

    #[test]
    fn test_fingerprint_optional_and_bool() {
        let none = {
            let mut fp = Fingerprint::new();
            fp.update_opt(None).update_bool(false);
            fp.finish()
        };
        let some = {
            let mut fp = Fingerprint::new();
            fp.update_opt(Some("")).update_bool(false);
            fp.finish()
        };

        assert_eq!(none.len(), 64);
        assert_ne!(none, some);
    }
}
