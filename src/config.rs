// ABOUTME: Version and CLI description constants

pub const VERSION: &str = "1.0.0";
pub const ABOUT: &str = "An interpreter for the RPAL applicative functional language";
pub const LONG_ABOUT: &str = "Runs an RPAL program through the lexer, parser, standardizer, \
and CSE machine, or dumps its abstract or standardized tree";
