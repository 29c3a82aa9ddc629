//! Sentences command implementation

use super::output::emit;
use super::{fail, Context};
use crate::cli::logging::log;
use crate::cli::LogLevel;
use crate::config::SentencesArgs;
use crate::io::load_sentences;

/// Sentences listed without `--verbose`
const PREVIEW: usize = 5;

pub fn run_sentences(args: SentencesArgs, ctx: &Context) -> Result<(), String> {
    let path = args.path.unwrap_or_else(|| ctx.config.sentences_path());
    let sentences = load_sentences(&path).map_err(fail)?;

    emit(ctx.format, &sentences, || {
        log(ctx.level, LogLevel::Normal, &format!("{} sentences in {}", sentences.len(), path.display()));
        let shown = if ctx.level == LogLevel::Verbose { sentences.len() } else { PREVIEW };
        for (i, sentence) in sentences.iter().take(shown).enumerate() {
            log(ctx.level, LogLevel::Normal, &format!("{i:>4}  {sentence}"));
        }
    })
}
