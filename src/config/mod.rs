pub(crate) mod opts;
pub(crate) mod text_props;
