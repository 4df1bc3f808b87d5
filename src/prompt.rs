//! Prompt composition.
//!
//! Pure, deterministic assembly of the instruction text sent to the
//! completion provider: the persona-driven system prompt, the per-topic
//! instruction blocks, the knowledge-base usage rules, and the
//! context-injection turn that carries retrieved material. No network
//! calls, no randomness.

use crate::persona::Persona;
use crate::topic::ConversationTopic;

/// Reply substituted when the completion provider fails. Keeps the
/// mentor voice instead of exposing a raw error.
pub const FALLBACK_ERROR: &str = "Okay, something went sideways on my end! Can you try asking \
     that again? I want to make sure I give you a solid answer.";

/// Reply for questions clearly outside the persona's expertise.
pub const FALLBACK_UNKNOWN_TOPIC: &str = "I appreciate you asking! That one is outside my \
     wheelhouse, though — I'm focused on hair and building beauty businesses. If there's \
     anything in that lane I can help with, I'm all in.";

/// Reply when a question is too thin to answer usefully.
pub const FALLBACK_NEED_MORE_INFO: &str = "I want to give you advice that fits YOUR situation. \
     Can you tell me a bit more — your hair type or porosity, or what stage your business is \
     at? The more I know, the better I can help.";

/// Build the system prompt from persona fields, topic instructions, and
/// (optionally) the knowledge-base usage rules.
pub fn system_prompt(
    persona: &Persona,
    topic: ConversationTopic,
    include_rag_instructions: bool,
) -> String {
    let expertise = format_map_bullets(&persona.expertise);
    let style = format_map_bullets(&persona.style);
    let guidelines = format_bullets(&persona.guidelines);
    let accuracy = format_bullets(&persona.accuracy_facts);
    let avoid = format_bullets(&persona.avoid);

    let topic_section = topic_instructions(topic);
    let rag_section = if include_rag_instructions {
        RAG_INSTRUCTIONS
    } else {
        ""
    };

    format!(
        "# You are {name} — Hair Business Mentor\n\
         \n\
         You are {identity}\n\
         \n\
         ## Your Role as a Mentor\n\
         \n\
         You are not just answering questions, you are mentoring:\n\
         - You care about each person's outcome, not just their question\n\
         - You pass on judgment earned from experience, not recited facts\n\
         - You teach people HOW to think, not only WHAT to do\n\
         - You stay honest even when the honest answer is unwelcome\n\
         \n\
         ## What You Know\n\
         {expertise}\n\
         \n\
         ## How You Communicate\n\
         {style}\n\
         \n\
         ## Your Mentoring Approach\n\
         {guidelines}\n\
         \n\
         ## Knowledge You Must Get Right\n\
         {accuracy}\n\
         \n\
         ## What You Don't Do\n\
         {avoid}\n\
         {topic_section}{rag_section}\n\
         ## Remember\n\
         \n\
         Every reply should leave them informed, able to act, and feeling like someone from \
         {brand} is genuinely in their corner. Speak naturally, like a real conversation.",
        name = persona.name,
        identity = persona.identity,
        expertise = expertise,
        style = style,
        guidelines = guidelines,
        accuracy = accuracy,
        avoid = avoid,
        topic_section = topic_section,
        rag_section = rag_section,
        brand = persona.brand,
    )
}

/// Wrap retrieved context for injection as an extra system turn.
///
/// Empty context yields an empty string so callers can append the result
/// unconditionally without creating a blank turn.
pub fn context_injection(context: &str) -> String {
    if context.trim().is_empty() {
        return String::new();
    }

    format!(
        "## Relevant Information\n\
         \n\
         The following material should inform your response:\n\
         \n\
         {}\n\
         \n\
         ---\n\
         \n\
         Work this in naturally; never tell the user where it came from.",
        context
    )
}

/// Static instruction block per topic; empty for
/// [`General`](ConversationTopic::General).
fn topic_instructions(topic: ConversationTopic) -> &'static str {
    match topic {
        ConversationTopic::HairEducation => {
            "\n## Hair Education Mode\n\
             \n\
             Understand their situation before teaching:\n\
             - Porosity first; if they don't know theirs, help them find out\n\
             - Then hair type, texture, and current routine\n\
             \n\
             Teach the why, not just the what:\n\
             - Low porosity: LCO method, lightweight products, gentle heat opens cuticles\n\
             - High porosity: LOC method, heavier products, sealing is essential\n\
             - Brittle or snapping hair needs moisture; limp or mushy hair needs protein\n\
             - Type 4 hair: never brush dry, always detangle wet with conditioner\n\
             \n\
             Break techniques into steps, as if demonstrating in person.\n"
        }
        ConversationTopic::BusinessMentorship => {
            "\n## Business Mentorship Mode\n\
             \n\
             Meet them where they are: starting out means foundations, growing means scaling \
             smart, struggling means finding the real problem.\n\
             \n\
             Give them working numbers:\n\
             - Pricing: time + products + overhead + profit, 30%+ margin or it isn't working\n\
             - A clientele takes 6-12 months to build; that is normal, not failure\n\
             - Separate business and personal money from day one, reserve 25-30% for taxes\n\
             - Booked out 4+ weeks means it is time to raise prices\n\
             - Retention beats chasing new clients every time\n\
             \n\
             Help them build a business that pays them without burning them out.\n"
        }
        ConversationTopic::ProductRecommendation => {
            "\n## Product Recommendation Mode\n\
             \n\
             Teach product selection rather than naming a single product:\n\
             - Porosity decides more than anything else\n\
             - Low porosity: water-based products, skip the heavy butters\n\
             - High porosity: richer creams and butters, protein fills the gaps\n\
             - Light oils (argan, grapeseed, jojoba) for low porosity; heavy oils (castor, \
             olive, avocado) for high\n\
             - First ingredient tells the story: water first moisturizes, oil first seals\n\
             \n\
             Ask about porosity, the problem they are solving, and budget before recommending.\n"
        }
        ConversationTopic::Troubleshooting => {
            "\n## Troubleshooting Mode\n\
             \n\
             Find the root cause before prescribing:\n\
             - Breakage: protein-moisture imbalance, rough handling, or tension styles?\n\
             - Dryness: wrong products for their porosity, no sealing, or buildup?\n\
             - No length retention: where is it actually breaking?\n\
             - No clients: visibility problem, pricing problem, or referral problem?\n\
             - No profit: underpricing, expense creep, or the wrong services?\n\
             \n\
             Ask the diagnostic questions, solve the cause not the symptom, and leave them \
             with a clear plan.\n"
        }
        ConversationTopic::General => "",
    }
}

/// Rules for working retrieved knowledge-base content into a reply.
const RAG_INSTRUCTIONS: &str = "\n## Using Knowledge Base Context\n\
     \n\
     When context from the knowledge base accompanies a message:\n\
     1. Prefer the provided context over general knowledge\n\
     2. Fold it into the reply seamlessly\n\
     3. Fill gaps with your own expertise when the context falls short\n\
     4. Never mention the knowledge base or any source to the user\n";

/// Render a label → description map as bold-label bullets.
fn format_map_bullets(items: &std::collections::BTreeMap<String, String>) -> String {
    items
        .iter()
        .map(|(key, value)| format!("- **{}**: {}", title_case(key), value))
        .collect::<Vec<_>>()
        .join("\n")
}

fn format_bullets(items: &[String]) -> String {
    items
        .iter()
        .map(|item| format!("- {}", item))
        .collect::<Vec<_>>()
        .join("\n")
}

/// `"hair_mastery"` → `"Hair Mastery"`.
fn title_case(key: &str) -> String {
    key.split('_')
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_contains_persona_name() {
        let persona = Persona::default();
        for topic in [
            ConversationTopic::General,
            ConversationTopic::HairEducation,
            ConversationTopic::Troubleshooting,
        ] {
            let prompt = system_prompt(&persona, topic, true);
            assert!(prompt.contains(&persona.name));
        }
    }

    #[test]
    fn test_topic_heading_present_for_specific_topics() {
        let persona = Persona::default();
        let cases = [
            (ConversationTopic::HairEducation, "## Hair Education Mode"),
            (
                ConversationTopic::BusinessMentorship,
                "## Business Mentorship Mode",
            ),
            (
                ConversationTopic::ProductRecommendation,
                "## Product Recommendation Mode",
            ),
            (ConversationTopic::Troubleshooting, "## Troubleshooting Mode"),
        ];
        for (topic, heading) in cases {
            let prompt = system_prompt(&persona, topic, true);
            assert!(prompt.contains(heading), "missing {}", heading);
        }
    }

    #[test]
    fn test_general_topic_has_no_mode_heading() {
        let prompt = system_prompt(&Persona::default(), ConversationTopic::General, true);
        assert!(!prompt.contains("Mode\n"));
    }

    #[test]
    fn test_rag_instructions_toggle() {
        let persona = Persona::default();
        let with = system_prompt(&persona, ConversationTopic::General, true);
        let without = system_prompt(&persona, ConversationTopic::General, false);
        assert!(with.contains("## Using Knowledge Base Context"));
        assert!(!without.contains("## Using Knowledge Base Context"));
    }

    #[test]
    fn test_prompt_is_deterministic() {
        let persona = Persona::default();
        let a = system_prompt(&persona, ConversationTopic::HairEducation, true);
        let b = system_prompt(&persona, ConversationTopic::HairEducation, true);
        assert_eq!(a, b);
    }

    #[test]
    fn test_context_injection_empty_in_empty_out() {
        assert_eq!(context_injection(""), "");
        assert_eq!(context_injection("   \n  "), "");
    }

    #[test]
    fn test_context_injection_wraps_content() {
        let injected = context_injection("**Porosity Guide**\nSome facts.");
        assert!(injected.starts_with("## Relevant Information"));
        assert!(injected.contains("**Porosity Guide**\nSome facts."));
        assert!(injected.contains("never tell the user"));
    }

    #[test]
    fn test_title_case() {
        assert_eq!(title_case("hair_mastery"), "Hair Mastery");
        assert_eq!(title_case("tone"), "Tone");
    }
}
