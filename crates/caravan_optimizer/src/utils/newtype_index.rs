#[macro_export]
macro_rules! define_index_newtype {
    ($name:ident) => {
        #[derive(
            serde::Serialize,
            serde::Deserialize,
            Debug,
            Clone,
            Copy,
            PartialEq,
            Eq,
            Hash,
            PartialOrd,
            Ord,
            Default,
        )]
        #[serde(transparent)]
        pub struct $name(usize);

        impl std::fmt::Display for $name {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                write!(f, "{}", self.0)
            }
        }

        impl $name {
            pub const fn new(index: usize) -> Self {
                Self(index)
            }

            pub const fn get(&self) -> usize {
                self.0
            }
        }

        impl From<usize> for $name {
            fn from(index: usize) -> Self {
                Self(index)
            }
        }
    };
    ($name:ident, $($t:ty),+) => {
        $crate::define_index_newtype!($name);
        $($crate::index_newtype_for!($name, $t);)+
    };
}

/// Lets a newtype index directly into `Vec<T>` and `[T]`.
#[macro_export]
macro_rules! index_newtype_for {
    ($name:ident, $t:ty) => {
        impl std::ops::Index<$name> for Vec<$t> {
            type Output = $t;
            fn index(&self, index: $name) -> &Self::Output {
                &self[index.get()]
            }
        }

        impl std::ops::IndexMut<$name> for Vec<$t> {
            fn index_mut(&mut self, index: $name) -> &mut Self::Output {
                &mut self[index.get()]
            }
        }

        impl std::ops::Index<$name> for [$t] {
            type Output = $t;
            fn index(&self, index: $name) -> &Self::Output {
                &self[index.get()]
            }
        }
    };
}

#[cfg(test)]
mod tests {
    define_index_newtype!(TestIdx, i64);

    #[test]
    fn test_index_vec_with_newtype() {
        let mut values: Vec<i64> = vec![10, 20, 30];
        let idx = TestIdx::new(1);

        assert_eq!(values[idx], 20);
        values[idx] = 25;
        assert_eq!(values[TestIdx::from(1)], 25);
        assert_eq!(idx.to_string(), "1");
    }
}
