//! Unique-by-construction numeric IDs.
//!
//! # Uniqueness
//! If a pair of [`Uid`] values are equal, then they are guaranteed to be
//! copies of each other: one must have been created by [`Uid::fresh`], and
//! the other must be a copy of that original [`Uid`]. Blocks, variable
//! declarations and variable references are all identified this way, so
//! identities survive renames and re-parenting without any table lookups.
//!
//! Ids are handed out from a single counter shared by every workspace in the
//! process. Nothing else about a workspace is global.

use std::{
    fmt,
    num::NonZeroU32,
    sync::atomic::{AtomicU32, Ordering},
};

static COUNTER: AtomicU32 = AtomicU32::new(1);

/// A unique-by-construction numeric identifier.
#[derive(Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
#[repr(transparent)]
pub struct Uid(NonZeroU32);

impl fmt::Debug for Uid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "⟨{}⟩", self.0)
    }
}

impl From<Uid> for u32 {
    fn from(value: Uid) -> Self {
        value.0.into()
    }
}

impl Uid {
    /// Returns a new unique [`Uid`].
    pub fn fresh() -> Uid {
        let raw_id = COUNTER.fetch_add(1, Ordering::Relaxed);

        // SAFETY: COUNTER is initialized to 1, and will monotonically increase
        // for the (practical) lifetime of the program; hence raw_id is never 0
        let uid = unsafe { NonZeroU32::new_unchecked(raw_id) };
        Uid(uid)
    }
}

/// Declares a newtype over [`Uid`] so that ids of different entities cannot
/// be confused with each other.
macro_rules! uid_newtype {
    ($(#[$attr:meta])* $name:ident, $prefix:literal) => {
        $(#[$attr])*
        #[derive(Hash, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
        pub struct $name(Uid);

        impl $name {
            pub fn fresh() -> Self {
                Self(Uid::fresh())
            }

            pub fn uid(self) -> Uid {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                write!(f, concat!($prefix, "{:?}"), self.0)
            }
        }
    };
}

uid_newtype!(
    /// Identifies a block in a [`Workspace`](crate::workspace::Workspace).
    BlockId,
    "block"
);

uid_newtype!(
    /// Identifies a variable declaration (a
    /// [`TypedVariableValue`](crate::binding::TypedVariableValue)).
    ValueId,
    "value"
);

uid_newtype!(
    /// Identifies a variable use-site (a
    /// [`TypedVariableValueReference`](crate::binding::TypedVariableValueReference)).
    RefId,
    "ref"
);

#[cfg(test)]
mod tests {
    use super::{BlockId, Uid, ValueId};

    #[test]
    fn id_uniqueness() {
        let a = Uid::fresh();
        let b = Uid::fresh();
        let c = Uid::fresh();
        assert_ne!(a, b);
        assert_ne!(b, c);
    }

    #[test]
    fn newtypes_draw_from_the_same_counter() {
        let block = BlockId::fresh();
        let value = ValueId::fresh();
        assert_ne!(block.uid(), value.uid());
        assert!(format!("{block:?}").starts_with("block⟨"));
    }
}
