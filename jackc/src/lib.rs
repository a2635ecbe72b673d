pub mod compile;
pub mod constants;
mod error;
pub mod lex;
pub mod source;
pub mod vm;

use self::{
    compile::{Compiler, CompilerConf},
    lex::{Lexer, TokenStream},
    vm::{Instruction, InstructionSink},
};

/// Compile the source of one class into a buffer of instructions.
///
/// The source must already be free of comments, see [`source::strip_comments`].
pub fn compile_str(source_code: &str, conf: CompilerConf) -> JackResult<Vec<Instruction>> {
    let mut instructions = vec![];
    compile_into(source_code, conf, &mut instructions)?;
    Ok(instructions)
}

/// Compile the source of one class, streaming instructions into the sink.
pub fn compile_into<S: InstructionSink>(source_code: &str, conf: CompilerConf, sink: S) -> JackResult<()> {
    let stream = TokenStream::new(Lexer::new(source_code)?);
    let mut compiler = Compiler::new(stream, sink, conf);
    compiler.compile()
}

pub mod prelude {
    pub use super::{
        compile::{Compiler, CompilerConf, OperatorOrder},
        compile_into, compile_str,
        error::{Diagnostic, JackError, JackResult},
        source::strip_comments,
        vm::{Instruction, InstructionSink, VmWriter},
    };
}

pub use self::error::{Diagnostic, JackError, JackResult};
