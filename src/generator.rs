use crate::assembler::assemble_request;
use crate::config::LlmConfig;
use crate::llm::LlmGenerator;
use crate::text::Scrubber;
use crate::usage::UsageTracker;
use crate::{HintRequest, Hints};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info};

/// Which path produced a hint set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HintSource {
    Llm,
    Fallback,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct GeneratedHints {
    pub hints: Hints,
    pub source: HintSource,
}

/// LLM first, deterministic assembly whenever that yields nothing.
pub struct HintGenerator {
    llm: LlmGenerator,
}

impl HintGenerator {
    pub fn new(config: LlmConfig, usage: UsageTracker) -> Self {
        Self::from_llm(LlmGenerator::new(config, usage))
    }

    /// Never calls out; every hint set comes from the deterministic path.
    pub fn deterministic() -> Self {
        Self::new(LlmConfig::disabled(), UsageTracker::ephemeral())
    }

    pub fn from_llm(llm: LlmGenerator) -> Self {
        Self { llm }
    }

    pub fn llm(&self) -> &LlmGenerator {
        &self.llm
    }

    pub fn usage(&self) -> &UsageTracker {
        self.llm.usage()
    }

    /// Always four non-empty hints.
    pub fn generate(&self, request: &HintRequest) -> GeneratedHints {
        if worth_asking(request) {
            if let Some(hints) = self.llm.generate(request) {
                return self.finish_llm(request, hints);
            }
        } else {
            debug!("no explanation or clue context, skipping LLM");
        }
        GeneratedHints {
            hints: assemble_request(request),
            source: HintSource::Fallback,
        }
    }

    pub fn hints(&self, request: &HintRequest) -> Hints {
        self.generate(request).hints
    }

    /// Results come back in request order. Without a usable LLM the clues
    /// are assembled in parallel; LLM calls stay sequential.
    pub fn generate_batch(&self, requests: &[HintRequest]) -> Vec<GeneratedHints> {
        if self.llm.readiness().is_ok() {
            info!(clues = requests.len(), "Generating hints with LLM");
            requests.iter().map(|request| self.generate(request)).collect()
        } else {
            info!(clues = requests.len(), "Generating deterministic hints");
            requests
                .par_iter()
                .map(|request| self.generate(request))
                .collect()
        }
    }

    fn finish_llm(&self, request: &HintRequest, hints: Hints) -> GeneratedHints {
        let scrubber = Scrubber::new(&request.paragraphs, request.answer());
        let mut hints = hints;
        let mut fallback: Option<Hints> = None;
        let mut backfilled = 0;
        for (idx, hint) in hints.levels_mut().iter_mut().enumerate() {
            if idx < 3 {
                *hint = scrubber.scrub(hint);
            }
            if hint.trim().is_empty() {
                let fallback = fallback.get_or_insert_with(|| assemble_request(request));
                *hint = fallback.as_array()[idx].clone();
                backfilled += 1;
            }
        }
        if backfilled > 0 {
            debug!(backfilled, "filled empty LLM levels from fallback");
        }
        let source = if backfilled == 4 {
            HintSource::Fallback
        } else {
            HintSource::Llm
        };
        GeneratedHints { hints, source }
    }
}

impl Default for HintGenerator {
    fn default() -> Self {
        Self::deterministic()
    }
}

/// An explanation, or at least the clue and its answer, to prompt with.
fn worth_asking(request: &HintRequest) -> bool {
    !request.is_unexplained() || (request.clue_text().is_some() && request.answer().is_some())
}
