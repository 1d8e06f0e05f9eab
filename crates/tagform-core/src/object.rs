use std::fmt;

use crate::fields::StaticFields;
use crate::handler::Instance;
use crate::magic::Magic;
use crate::registry::EntryKey;

/// A live tagged object.
///
/// Built by [`Engine::create`](crate::Engine::create),
/// [`Engine::pack`](crate::Engine::pack) or
/// [`Engine::unserialize`](crate::Engine::unserialize) and handed back to
/// [`Engine::destroy`](crate::Engine::destroy) exactly once. Dropping an
/// object without destroying it keeps its handler entry counted as in use
/// until the engine shuts down.
#[must_use = "objects must be released with Engine::destroy"]
pub struct Object {
    pub(crate) magic: Magic,
    pub(crate) key: EntryKey,
    pub(crate) fields: StaticFields,
    pub(crate) instance: Instance,
}

impl Object {
    /// Magic of the handler that built this object.
    pub fn magic(&self) -> Magic {
        self.magic
    }

    pub fn static_fields(&self) -> &StaticFields {
        &self.fields
    }

    pub fn static_fields_mut(&mut self) -> &mut StaticFields {
        &mut self.fields
    }

    /// Registry entry this object counts against.
    pub fn entry_key(&self) -> EntryKey {
        self.key
    }
}

impl fmt::Debug for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Object")
            .field("magic", &self.magic)
            .field("static_fields", &self.fields)
            .finish_non_exhaustive()
    }
}
