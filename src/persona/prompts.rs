//! Prompt templates for per-chunk analysis and final consolidation.

/// System message sent with every chat completion.
pub const ANALYST_PRIMER: &str = "You are a professional behavioral analyst.";

/// Section headers each chunk analysis must fill, in order.
pub const PERSONA_SECTIONS: [&str; 9] = [
    "# 🎂 Estimated Age Range:",
    "# 💼 Likely Occupation / Background:",
    "# 🎯 Motivations / Values:",
    "# 🧠 Thinking Style / Communication Style:",
    "# 📱 Online Behavior Patterns:",
    "# 💬 Personality Traits (with evidence or citations):",
    "# 🎮 Interests / Hobbies / Expertise Areas:",
    "# 😤 Frustrations / Pet Peeves:",
    "# 🧠 Summary Insight:",
];

/// Section headers of the final persona. Same order as [`PERSONA_SECTIONS`];
/// only the personality line asks for citations more softly.
pub const CONSOLIDATION_SECTIONS: [&str; 9] = [
    "# 🎂 Estimated Age Range:",
    "# 💼 Likely Occupation / Background:",
    "# 🎯 Motivations / Values:",
    "# 🧠 Thinking Style / Communication Style:",
    "# 📱 Online Behavior Patterns:",
    "# 💬 Personality Traits (with citations if possible):",
    "# 🎮 Interests / Hobbies / Expertise Areas:",
    "# 😤 Frustrations / Pet Peeves:",
    "# 🧠 Summary Insight:",
];

fn section_block(sections: &[&str]) -> String {
    sections.join("\n")
}

/// Instructional header placed before the records of one chunk.
pub fn chunk_header(username: &str) -> String {
    format!(
        r#"
You are a behavioral analyst. ALL of the following Reddit posts and comments were written by the same user: u/{username}.

Your task is to analyze their language, content, tone, and behavior to create a professional-level user persona report.

---
**Username:** {username}

{sections}

Please don't cite post/comment
---
"#,
        sections = section_block(&PERSONA_SECTIONS)
    )
}

/// Instructional header placed before the joined partial summaries.
pub fn consolidation_header(username: &str) -> String {
    format!(
        r#"
You are a professional behavioral analyst.

The following are partial persona summaries derived from Reddit activity by u/{username}.

Your job is to merge and distill all this information into ONE final, polished, non-redundant user persona.

The final output must follow this format:

**Username:** {username}

{sections}

Be clear, professional, and focused only on u/{username}.

---

Partial insights:
"#,
        sections = section_block(&CONSOLIDATION_SECTIONS)
    )
}
