use crate::ast::{Pipeline, PipelineStage};
use crate::environment::VarLookup;
use crate::expander::{expand_words, substitute_for_lexer};
use crate::lexer::{LexError, Lexer};

/// Turn a raw line into a [`Pipeline`].
///
/// Stages are split on unquoted pipes first; each stage is then substituted
/// against `vars` and split into arguments.
pub fn parse_line<L: VarLookup + ?Sized>(line: &str, vars: &L) -> Result<Pipeline, LexError> {
    let raw = Lexer::split_pipeline(line)?;
    let single = raw.len() == 1;
    let mut stages = Vec::with_capacity(raw.len());

    for (index, stage) in raw.into_iter().enumerate() {
        let substituted = substitute_for_lexer(stage, vars);
        let tokens = Lexer::split_words(&substituted)?;
        let argv = expand_words(tokens, vars);

        if argv.is_empty() {
            // e.g. a lone `${EMPTY}`
            if single {
                return Ok(Pipeline::default());
            }
            return Err(LexError::EmptyPipelineStage { index });
        }
        stages.push(PipelineStage { argv });
    }

    log::debug!("parsed {} stage(s): {:?}", stages.len(), stages);
    Ok(Pipeline { stages })
}
