pub(crate) mod compositor;
pub(crate) mod plan;
pub(crate) mod template;
