mod common;
mod debug;
mod root;
mod track;

pub(crate) use root::get_args;
