use std::{collections::HashMap, fmt, hash::Hash, marker::PhantomData, num::NonZeroU32, rc::Rc};

/// A handle to an interned value of type `T`, such as an identifier. Handles
/// from different interners must not be mixed. Use [`Interner::get`] to read
/// the value back.
pub struct Interned<T: ?Sized> {
    // Non-zero so that `Option<Interned<T>>` stays four bytes wide.
    index: NonZeroU32,
    _ty: PhantomData<T>,
}

impl<T: ?Sized> Interned<T> {
    const fn from_index(index: NonZeroU32) -> Self {
        Interned {
            index,
            _ty: PhantomData,
        }
    }

    /// Position of the value in insertion order, starting at zero.
    fn slot(self) -> usize {
        self.index.get() as usize - 1
    }
}

impl<T: ?Sized> Copy for Interned<T> {}

impl<T: ?Sized> Clone for Interned<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Hash for Interned<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.index.hash(state);
    }
}

impl<T: ?Sized> PartialEq for Interned<T> {
    fn eq(&self, other: &Self) -> bool {
        self.index == other.index
    }
}

impl<T: ?Sized> Eq for Interned<T> {}

impl<T: ?Sized> fmt::Debug for Interned<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.index)
    }
}

impl<T: ?Sized> From<&Interned<T>> for Interned<T> {
    fn from(value: &Interned<T>) -> Self {
        *value
    }
}

/// Deduplicating storage for identifiers. Every pass of one compilation shares
/// a single interner, so a name maps to the same handle everywhere.
pub struct Interner<T: ?Sized> {
    handles: HashMap<Rc<T>, Interned<T>>,
    values: Vec<Rc<T>>,
}

impl fmt::Debug for Interner<str> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.values.iter()).finish()
    }
}

impl<T: ?Sized> Interner<T> {
    pub fn with_capacity(capacity: usize) -> Self {
        Interner {
            handles: HashMap::with_capacity(capacity),
            values: Vec::with_capacity(capacity),
        }
    }

    /// Number of distinct values interned so far.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Returns the handle for `value`, storing it first if it was never seen.
    pub fn intern(&mut self, value: &T) -> Interned<T>
    where
        T: Eq + Hash + ToOwned,
        T::Owned: Into<Rc<T>>,
    {
        if let Some(handle) = self.handles.get(value) {
            return *handle;
        }
        let handle = u32::try_from(self.values.len() + 1)
            .ok()
            .and_then(NonZeroU32::new)
            .map(Interned::from_index)
            .expect("interner out of capacity");
        let key: Rc<T> = value.to_owned().into();
        self.values.push(Rc::clone(&key));
        self.handles.insert(key, handle);
        handle
    }

    /// Returns the handle for `value` without storing it.
    pub fn lookup(&self, value: &T) -> Option<Interned<T>>
    where
        T: Eq + Hash,
    {
        self.handles.get(value).copied()
    }

    /// Returns the value behind a handle. Panics on a handle from another
    /// interner.
    pub fn get(&self, handle: impl Into<Interned<T>>) -> &T {
        &self.values[handle.into().slot()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn same_name_same_handle() {
        let mut i = Interner::<str>::with_capacity(2);

        let main = i.intern("main");
        let printf = i.intern("printf");
        assert_eq!(i.intern("main"), main);
        assert_ne!(main, printf);

        assert_eq!(i.get(main), "main");
        assert_eq!(i.get(&printf), "printf");
        assert_eq!(i.len(), 2);
    }

    #[test]
    fn lookup_does_not_store() {
        let mut i = Interner::<str>::with_capacity(1);
        assert!(i.lookup("x").is_none());
        assert!(i.is_empty());

        let x = i.intern("x");
        assert_eq!(i.lookup("x"), Some(x));
    }
}
