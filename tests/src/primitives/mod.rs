mod edit;
mod scanner;
mod syntax;
