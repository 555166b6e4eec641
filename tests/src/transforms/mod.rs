mod arithmetic;
mod control_flow;
mod dead_code;
mod properties;
mod rename;
mod string_literal;
