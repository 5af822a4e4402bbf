pub mod api;
pub mod atoms;
pub mod boxes;
pub mod decode;
pub mod known_boxes;
pub mod parser;
pub mod program;
pub mod reader;
pub mod util;

pub use api::{Error, extract, extract_file};
pub use atoms::{
    Atom, AvcConfigAtom, ColorInfoAtom, Extension, FileTypeAtom, GenericAtom, MovieHeaderAtom,
    SampleDescription, SampleTableAtom, VideoSampleDescription,
};
pub use boxes::{BoxHeader, FourCC};
pub use parser::{ParseError, StructuralError};
pub use program::{Directive, Op, Program, SyntaxError, compile, compile_lines};
pub use reader::{Extraction, execute, execute_with_file_type};
