//! Context serializer: renders a workspace into the tagged context blob.
//!
//! The blob is a sequence of `[TAG:value]` lines, or `[TAG:\nvalue]` when the
//! value spans several lines. Tags appear in a fixed order and only when
//! their source data is non-empty:
//!
//! | Tag | Source |
//! |-----|--------|
//! | `TIMESTAMP` | request time (RFC 3339, UTC) |
//! | `IDENTITY` | `persona name|DOMAIN_ID` |
//! | `OBJECTIVE` | persona objective |
//! | `GOLDEN_RULES` | persona rules, one `- rule` per line |
//! | `USER` | user id |
//! | `RECENT_HISTORY` | episodic memories, oldest first |
//! | `CURRENT_SESSION` | domain session summary |
//! | `ACTIVE_TASK` | domain active task |
//! | `RELEVANT_MEMORY_<n>` | ranked semantic memories, 1-indexed |
//! | `INPUT_DATA` | task data as compact JSON |
//! | `USER_INPUT` | the request text, quoted |
//!
//! Downstream consumers parse these tags, so spelling and order are fixed.
//!
//! # Determinism
//!
//! Rendering is a pure function of its input: the timestamp is passed in,
//! never read from the clock here.

use attune_core::memory::EpisodicMemory;
use attune_core::persona::Persona;
use attune_core::workspace::{CognitiveWorkspace, DomainState};
use chrono::{DateTime, SecondsFormat, Utc};
use std::fmt::Write;

/// At most this many `RELEVANT_MEMORY_*` tags are rendered.
pub const MAX_RELEVANT_MEMORIES: usize = 3;

/// At most this many turns appear in `RECENT_HISTORY`.
pub const MAX_HISTORY_TURNS: usize = 5;

/// Everything needed to render one context blob.
pub struct SerializeInput<'a> {
    pub workspace: &'a CognitiveWorkspace,
    /// Persona of the focused domain, if the catalog knows it.
    pub persona: Option<&'a Persona>,
    pub user_input: &'a str,
    pub timestamp: DateTime<Utc>,
}

pub struct ContextSerializer;

impl ContextSerializer {
    /// Render the focused domain of `input.workspace`.
    ///
    /// A workspace without focus, or a focus without a persona, renders as
    /// the single-line placeholder from [`ContextSerializer::missing_persona`].
    pub fn render(input: &SerializeInput<'_>) -> String {
        let focus = input.workspace.current_focus.as_deref().unwrap_or_default();
        let Some(persona) = input.persona else {
            return Self::missing_persona(focus);
        };
        let empty = DomainState::default();
        let state = input.workspace.focused().unwrap_or(&empty);

        let mut out = String::new();

        // ── Header ───────────────────────────────────────────────────────
        push_tag(
            &mut out,
            "TIMESTAMP",
            &input.timestamp.to_rfc3339_opts(SecondsFormat::Secs, true),
        );
        push_tag(
            &mut out,
            "IDENTITY",
            &format!("{}|{}", persona.display_name, focus.to_uppercase()),
        );
        push_tag(&mut out, "OBJECTIVE", &persona.config.objective);
        push_tag(
            &mut out,
            "GOLDEN_RULES",
            &bulleted(&persona.config.golden_rules),
        );
        push_tag(&mut out, "USER", &input.workspace.user_id);

        // ── Domain state ─────────────────────────────────────────────────
        push_tag(
            &mut out,
            "RECENT_HISTORY",
            &render_history(&state.episodic_memories),
        );
        push_tag(&mut out, "CURRENT_SESSION", &state.session_summary);
        push_tag(&mut out, "ACTIVE_TASK", &state.active_task);
        // Numbering skips blank memories so the tags stay contiguous
        for (i, memory) in state
            .semantic_memories
            .iter()
            .filter(|m| !m.text.is_empty())
            .take(MAX_RELEVANT_MEMORIES)
            .enumerate()
        {
            push_tag(&mut out, &format!("RELEVANT_MEMORY_{}", i + 1), &memory.text);
        }
        if let Some(data) = state.task_data.as_ref().filter(|d| !d.is_null()) {
            push_tag(&mut out, "INPUT_DATA", &data.to_string());
        }

        // ── Request ──────────────────────────────────────────────────────
        if !input.user_input.is_empty() {
            push_tag(&mut out, "USER_INPUT", &format!("\"{}\"", input.user_input));
        }

        // No trailing newline
        out.truncate(out.trim_end_matches('\n').len());
        out
    }

    /// The diagnostic returned when a domain has no persona.
    pub fn missing_persona(domain_id: &str) -> String {
        format!("[ERROR: persona '{domain_id}' not found]")
    }
}

fn push_tag(out: &mut String, tag: &str, value: &str) {
    if value.is_empty() {
        return;
    }
    let sep = if value.contains('\n') { "\n" } else { "" };
    let _ = writeln!(out, "[{tag}:{sep}{value}]");
}

fn bulleted(rules: &[String]) -> String {
    rules
        .iter()
        .filter(|r| !r.trim().is_empty())
        .map(|r| format!("- {r}"))
        .collect::<Vec<_>>()
        .join("\n")
}

/// The first [`MAX_HISTORY_TURNS`] ranked turns, laid out oldest first.
fn render_history(episodes: &[EpisodicMemory]) -> String {
    let mut turns: Vec<&EpisodicMemory> = episodes.iter().take(MAX_HISTORY_TURNS).collect();
    turns.sort_by_key(|e| e.timestamp);

    let mut lines = Vec::with_capacity(turns.len() * 2);
    for turn in turns {
        lines.push(format!("User: {}", turn.user_input));
        lines.push(format!("Assistant: {}", turn.assistant_output));
    }
    lines.join("\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use attune_core::memory::SemanticMemory;
    use attune_core::persona::PersonaConfig;
    use attune_core::workspace::DomainStatus;
    use chrono::{Duration, TimeZone};

    // ── Helpers ────────────────────────────────────────────────────────

    fn at() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 10, 19, 12, 0, 0).unwrap()
    }

    fn fiscal_persona() -> Persona {
        Persona {
            id: "fiscal".into(),
            display_name: "Fiscal Analyst".into(),
            semantic_description: "Invoices and taxes".into(),
            config: PersonaConfig {
                role_description: "You analyse fiscal documents.".into(),
                objective: "Validate invoices".into(),
                golden_rules: vec!["Never invent tax values".into(), "Cite the rule".into()],
            },
        }
    }

    fn episode(input: &str, output: &str, minutes: i64) -> EpisodicMemory {
        EpisodicMemory {
            user_id: "u1".into(),
            domain_id: "fiscal".into(),
            user_input: input.into(),
            assistant_output: output.into(),
            timestamp: at() + Duration::minutes(minutes),
        }
    }

    fn workspace_with(state: DomainState) -> CognitiveWorkspace {
        let mut ws = CognitiveWorkspace::new("u1");
        ws.current_focus = Some("fiscal".into());
        ws.active_domains.insert("fiscal".into(), state);
        ws
    }

    fn render(ws: &CognitiveWorkspace, persona: Option<&Persona>, user_input: &str) -> String {
        ContextSerializer::render(&SerializeInput {
            workspace: ws,
            persona,
            user_input,
            timestamp: at(),
        })
    }

    fn tags(blob: &str) -> Vec<&str> {
        blob.lines()
            .filter_map(|l| l.strip_prefix('['))
            .filter_map(|l| l.split(':').next())
            .collect()
    }

    // ── Tests ──────────────────────────────────────────────────────────

    #[test]
    fn full_blob_layout() {
        let ws = workspace_with(DomainState {
            status: DomainStatus::Active,
            session_summary: "Reviewing March invoices".into(),
            active_task: "Processing user input: 'check invoice 999' in domain 'fiscal'".into(),
            semantic_memories: vec![SemanticMemory::new("m1", "fiscal", "ICMS is a state tax")],
            episodic_memories: vec![episode("hi", "hello", 0)],
            task_data: Some(serde_json::json!({"total": 10})),
        });
        let persona = fiscal_persona();
        let blob = render(&ws, Some(&persona), "check invoice 999");

        let expected = "\
[TIMESTAMP:2026-10-19T12:00:00Z]
[IDENTITY:Fiscal Analyst|FISCAL]
[OBJECTIVE:Validate invoices]
[GOLDEN_RULES:
- Never invent tax values
- Cite the rule]
[USER:u1]
[RECENT_HISTORY:
User: hi
Assistant: hello]
[CURRENT_SESSION:Reviewing March invoices]
[ACTIVE_TASK:Processing user input: 'check invoice 999' in domain 'fiscal']
[RELEVANT_MEMORY_1:ICMS is a state tax]
[INPUT_DATA:{\"total\":10}]
[USER_INPUT:\"check invoice 999\"]";
        assert_eq!(blob, expected);
    }

    #[test]
    fn empty_sources_are_omitted() {
        let ws = workspace_with(DomainState::default());
        let mut persona = fiscal_persona();
        persona.config.objective.clear();
        persona.config.golden_rules.clear();

        let blob = render(&ws, Some(&persona), "");
        assert_eq!(tags(&blob), vec!["TIMESTAMP", "IDENTITY", "USER"]);
    }

    #[test]
    fn missing_persona_is_single_placeholder() {
        let ws = workspace_with(DomainState::default());
        let blob = render(&ws, None, "anything");
        assert_eq!(blob, "[ERROR: persona 'fiscal' not found]");
    }

    #[test]
    fn truncation_bounds_hold_for_oversized_state() {
        let ws = workspace_with(DomainState {
            semantic_memories: (0..6)
                .map(|i| SemanticMemory::new(format!("m{i}"), "fiscal", format!("fact {i}")))
                .collect(),
            episodic_memories: (0..8).map(|i| episode("q", "a", i)).collect(),
            ..Default::default()
        });
        let blob = render(&ws, Some(&fiscal_persona()), "q");

        let memory_tags = tags(&blob)
            .into_iter()
            .filter(|t| t.starts_with("RELEVANT_MEMORY_"))
            .count();
        assert_eq!(memory_tags, MAX_RELEVANT_MEMORIES);
        assert_eq!(blob.matches("User: ").count(), MAX_HISTORY_TURNS);
        assert!(!blob.contains("RELEVANT_MEMORY_4"));
    }

    #[test]
    fn relevant_memories_keep_ranked_order() {
        let ws = workspace_with(DomainState {
            semantic_memories: vec![
                SemanticMemory::new("b", "fiscal", "second"),
                SemanticMemory::new("a", "fiscal", "first"),
            ],
            ..Default::default()
        });
        let blob = render(&ws, Some(&fiscal_persona()), "");
        assert!(blob.contains("[RELEVANT_MEMORY_1:second]\n[RELEVANT_MEMORY_2:first]"));
    }

    #[test]
    fn blank_memories_do_not_leave_numbering_gaps() {
        let ws = workspace_with(DomainState {
            semantic_memories: vec![
                SemanticMemory::new("blank", "fiscal", ""),
                SemanticMemory::new("a", "fiscal", "first"),
                SemanticMemory::new("b", "fiscal", "second"),
            ],
            ..Default::default()
        });
        let blob = render(&ws, Some(&fiscal_persona()), "");
        assert!(blob.contains("[RELEVANT_MEMORY_1:first]\n[RELEVANT_MEMORY_2:second]"));
        assert!(!blob.contains("RELEVANT_MEMORY_3"));
    }

    #[test]
    fn history_is_rendered_oldest_first() {
        let ws = workspace_with(DomainState {
            episodic_memories: vec![episode("newer", "n", 5), episode("older", "o", 1)],
            ..Default::default()
        });
        let blob = render(&ws, Some(&fiscal_persona()), "");
        let older = blob.find("User: older").unwrap();
        let newer = blob.find("User: newer").unwrap();
        assert!(older < newer);
    }

    #[test]
    fn multi_line_summary_uses_block_form() {
        let ws = workspace_with(DomainState {
            session_summary: "line one\nline two".into(),
            ..Default::default()
        });
        let blob = render(&ws, Some(&fiscal_persona()), "");
        assert!(blob.contains("[CURRENT_SESSION:\nline one\nline two]"));
    }

    #[test]
    fn null_task_data_is_omitted() {
        let ws = workspace_with(DomainState {
            task_data: Some(serde_json::Value::Null),
            ..Default::default()
        });
        let blob = render(&ws, Some(&fiscal_persona()), "");
        assert!(!blob.contains("INPUT_DATA"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let ws = workspace_with(DomainState {
            semantic_memories: vec![SemanticMemory::new("m", "fiscal", "x")],
            ..Default::default()
        });
        let persona = fiscal_persona();
        assert_eq!(
            render(&ws, Some(&persona), "same"),
            render(&ws, Some(&persona), "same")
        );
    }
}
