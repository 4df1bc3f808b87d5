//! Conversation topic detection.
//!
//! Maps a free-text message to one of a fixed set of topics by counting
//! keyword substring hits. The winning topic selects which specialized
//! instruction block the prompt composer appends to the system prompt.

use std::fmt;
use std::str::FromStr;

/// The kind of help a message is asking for.
///
/// A closed set: adding a topic means adding a variant, its keyword set,
/// and its instruction block, all checked exhaustively at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConversationTopic {
    HairEducation,
    BusinessMentorship,
    ProductRecommendation,
    Troubleshooting,
    General,
}

/// Tie-break order, most specific first. A message scoring equally for
/// troubleshooting and hair education is a troubleshooting message.
const PRIORITY: [ConversationTopic; 4] = [
    ConversationTopic::Troubleshooting,
    ConversationTopic::ProductRecommendation,
    ConversationTopic::BusinessMentorship,
    ConversationTopic::HairEducation,
];

impl ConversationTopic {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConversationTopic::HairEducation => "hair_education",
            ConversationTopic::BusinessMentorship => "business_mentorship",
            ConversationTopic::ProductRecommendation => "product_recommendation",
            ConversationTopic::Troubleshooting => "troubleshooting",
            ConversationTopic::General => "general",
        }
    }

    /// Keyword substrings associated with this topic. Containment
    /// anywhere in the lowercased message counts as a hit; there is no
    /// word-boundary matching.
    fn keywords(self) -> &'static [&'static str] {
        match self {
            ConversationTopic::HairEducation => &[
                "hair", "curl", "braid", "style", "texture", "moisture", "protein", "wash",
                "condition", "detangle", "protective", "natural", "relaxed", "extension", "wig",
                "loc", "twist", "coil", "strand", "scalp", "growth",
            ],
            ConversationTopic::BusinessMentorship => &[
                "business", "client", "price", "pricing", "marketing", "social media",
                "instagram", "booking", "salon", "brand", "money", "income", "profit",
                "customer", "service", "charge", "start", "grow", "scale", "invest",
            ],
            ConversationTopic::ProductRecommendation => &[
                "product", "recommend", "buy", "purchase", "ingredient", "shampoo",
                "conditioner", "oil", "cream", "gel", "spray", "serum", "mask", "treatment",
            ],
            ConversationTopic::Troubleshooting => &[
                "problem", "issue", "help", "wrong", "damage", "break", "dry", "brittle",
                "falling", "thinning", "not working", "failed", "mistake", "fix", "repair",
            ],
            ConversationTopic::General => &[],
        }
    }

    /// Classify a message by keyword scoring.
    ///
    /// Counts keyword hits per topic; zero hits everywhere means
    /// [`General`](ConversationTopic::General), otherwise the
    /// highest-scoring topic wins with ties resolved by [`PRIORITY`].
    pub fn classify(message: &str) -> ConversationTopic {
        let message = message.to_lowercase();

        let scores: Vec<(ConversationTopic, usize)> = PRIORITY
            .iter()
            .map(|&topic| {
                let hits = topic
                    .keywords()
                    .iter()
                    .filter(|kw| message.contains(*kw))
                    .count();
                (topic, hits)
            })
            .collect();

        let max = scores.iter().map(|(_, n)| *n).max().unwrap_or(0);
        if max == 0 {
            return ConversationTopic::General;
        }

        scores
            .iter()
            .find(|(_, n)| *n == max)
            .map(|(topic, _)| *topic)
            .unwrap_or(ConversationTopic::General)
    }
}

impl fmt::Display for ConversationTopic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ConversationTopic {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hair_education" => Ok(ConversationTopic::HairEducation),
            "business_mentorship" => Ok(ConversationTopic::BusinessMentorship),
            "product_recommendation" => Ok(ConversationTopic::ProductRecommendation),
            "troubleshooting" => Ok(ConversationTopic::Troubleshooting),
            "general" => Ok(ConversationTopic::General),
            other => Err(format!(
                "unknown topic '{}'; expected one of hair_education, business_mentorship, \
                 product_recommendation, troubleshooting, general",
                other
            )),
        }
    }
}
