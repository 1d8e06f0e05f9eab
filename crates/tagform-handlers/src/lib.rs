//! Ready-made handlers.
//!
//! - [`BlobHandler`] (`blob`): opaque bytes, with their length and a
//!   caller-defined tag in static fields
//! - [`WordsHandler`] (`wd32`): an array of `u32`, host order on the raw
//!   side and little-endian on the wire

pub mod blob;
pub mod words;

pub use blob::{BlobHandler, BLOB_MAGIC};
pub use words::{WordsHandler, WORDS_MAGIC};

use tagform_core::{Engine, HandlerDescriptor, Magic, Result};

/// Magics of every built-in handler.
pub fn builtin_magics() -> [&'static str; 2] {
    [BLOB_MAGIC, WORDS_MAGIC]
}

/// Whether `magic` names a built-in handler.
pub fn is_builtin(magic: Magic) -> bool {
    builtin_magics().iter().any(|m| *m == magic.as_str())
}

/// Register every built-in handler under its default magic.
pub fn register_builtin(engine: &mut Engine) -> Result<()> {
    engine.register(BLOB_MAGIC, HandlerDescriptor::new(BlobHandler))?;
    engine.register(WORDS_MAGIC, HandlerDescriptor::new(WordsHandler))?;
    Ok(())
}

#[cfg(test)]
pub(crate) fn random_bytes(len: usize) -> Vec<u8> {
    std::iter::repeat_with(|| fastrand::u8(..))
        .take(len)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_all_builtins() {
        let mut engine = Engine::new();
        engine.init().unwrap();
        register_builtin(&mut engine).unwrap();

        for magic in builtin_magics() {
            assert!(engine.is_registered(magic));
            assert!(is_builtin(Magic::new(magic).unwrap()));
        }
        assert!(!is_builtin(Magic::new("spl1").unwrap()));
        assert!(register_builtin(&mut engine).is_err());
    }
}
