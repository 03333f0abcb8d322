// Vector methods for a `Vec<T>` newtype (with a field called `inner`) that's
// indexed by a `usize` tuple struct, so that indices into different arenas
// can't get mixed up.
macro_rules! impl_typed_vec {
    ($vec_name:ident, $idx_name:ident, $dbg_prefix:expr) => {
        impl std::fmt::Debug for $idx_name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}_{}", $dbg_prefix, self.0)
            }
        }

        #[allow(dead_code)]
        impl<T> $vec_name<T> {
            /// All the valid indices, in order.
            pub fn indices(&self) -> impl Iterator<Item = $idx_name> {
                (0..self.inner.len()).map($idx_name)
            }

            pub fn len(&self) -> usize {
                self.inner.len()
            }

            pub fn is_empty(&self) -> bool {
                self.inner.is_empty()
            }

            /// The index that the next `push` will get.
            pub fn next_idx(&self) -> $idx_name {
                $idx_name(self.inner.len())
            }

            pub fn push(&mut self, elt: T) -> $idx_name {
                let idx = self.next_idx();
                self.inner.push(elt);
                idx
            }
        }

        impl<T: Default + Clone> $vec_name<T> {
            /// `size` default values.
            pub fn with_size(size: usize) -> Self {
                Self {
                    inner: vec![T::default(); size],
                }
            }
        }

        impl<T> Default for $vec_name<T> {
            fn default() -> Self {
                Self { inner: Vec::new() }
            }
        }

        impl<T> std::ops::Index<$idx_name> for $vec_name<T> {
            type Output = T;

            fn index(&self, index: $idx_name) -> &T {
                &self.inner[index.0]
            }
        }

        impl<T> std::ops::IndexMut<$idx_name> for $vec_name<T> {
            fn index_mut(&mut self, index: $idx_name) -> &mut T {
                &mut self.inner[index.0]
            }
        }

        impl<T: std::fmt::Debug> std::fmt::Debug for $vec_name<T> {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.debug_map()
                    .entries(self.indices().map(|idx| (idx, &self[idx])))
                    .finish()
            }
        }
    };
}
