use crate::define_index_newtype;

define_index_newtype!(NodeIdx, i64, Option<usize>);
