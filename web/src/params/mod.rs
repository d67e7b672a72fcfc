pub(crate) mod send;
