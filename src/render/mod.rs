pub(crate) mod cpu;
pub(crate) mod encode;
pub(crate) mod fonts;
pub(crate) mod pipeline;
