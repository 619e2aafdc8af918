//! Prompt templates for the LLM backend.
//!
//! The "original" pipeline uses the base system prompt of each genre; the
//! enhanced ("mcp") pipeline uses a broader prompt that also embeds the
//! work's title, author and year.

use crate::domain::{ComparisonType, Genre};
use crate::requests::{AnalysisRequest, WorkRef};

/// A system + user message pair ready to be sent to the LLM backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Prompt {
    pub system: String,
    pub user: String,
}

impl Prompt {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
        }
    }
}

const SF_SYSTEM: &str = "You are an expert in science fiction literature and media.
Your task is to analyze science fiction content and provide insights about:
1. Themes and motifs
2. Scientific concepts and their plausibility
3. Social and philosophical implications
4. Comparisons to other works in the genre
5. Cultural impact and significance
6. Writing style and narrative techniques
7. World-building elements
8. Character development and relationships
9. Plot structure and pacing
10. Potential influences and inspirations

Provide detailed analysis while maintaining a professional and insightful tone.";

const SF_SYSTEM_ENHANCED: &str = "You are an advanced expert in science fiction literature and media, with enhanced capabilities for:
1. Deep thematic analysis and pattern recognition
2. Cross-referencing with extensive knowledge bases
3. Predictive analysis of cultural impact
4. Comparative analysis across multiple works
5. Advanced world-building evaluation
6. Character archetype and development analysis
7. Plot structure optimization suggestions
8. Scientific concept validation and critique
9. Social and philosophical implications analysis
10. Historical context and influence tracing

Provide comprehensive, data-driven analysis while maintaining a professional and insightful tone.";

const COMICS_SYSTEM: &str = "You are an expert in comics and graphic novels.
Your task is to analyze comic content and provide insights about:
1. Art style and visual storytelling
2. Panel layout and composition
3. Character design and development
4. Storytelling techniques
5. Themes and symbolism
6. Cultural and historical context
7. Writing and dialogue
8. Color theory and use
9. Influences and references
10. Impact on the medium

Provide detailed analysis while maintaining a professional and insightful tone.";

const COMICS_SYSTEM_ENHANCED: &str = "You are an expert in comics and graphic novels with enhanced analytical capabilities.
Your task is to analyze comic content and provide detailed insights about:
1. Art style and visual storytelling techniques
2. Panel layout and composition analysis
3. Character design and development patterns
4. Storytelling techniques and narrative structure
5. Themes, symbolism, and subtext
6. Cultural and historical context
7. Writing style and dialogue effectiveness
8. Color theory and visual impact
9. Influences and references
10. Impact on the medium and genre evolution
11. Technical execution and production quality
12. Audience reception and critical analysis

Provide comprehensive analysis while maintaining a professional and insightful tone. Include specific examples and references where relevant.";

const RPG_SYSTEM: &str = "You are an expert in tabletop role-playing games (RPGs).
Your task is to analyze RPG content and provide insights about:
1. Game mechanics and systems
2. World-building and setting
3. Character creation and progression
4. Balance and playability
5. Narrative structure and storytelling
6. Rules clarity and organization
7. Player agency and choice
8. Combat and conflict resolution
9. Social interaction mechanics
10. Resource management
11. Difficulty scaling
12. Replayability and variety

Provide detailed analysis while maintaining a professional and insightful tone.";

const RPG_SYSTEM_ENHANCED: &str = "You are an expert in tabletop role-playing games (RPGs) with enhanced analytical capabilities.
Your task is to analyze RPG content and provide detailed insights about:
1. Game mechanics, probability curves and system design
2. World-building, setting and lore consistency
3. Character creation, progression and build diversity
4. Balance, playability and edge cases
5. Narrative structure and emergent storytelling
6. Rules clarity, organization and reference usability
7. Player agency and meaningful choice
8. Combat and conflict resolution pacing
9. Social interaction mechanics
10. Resource management and economy
11. Difficulty scaling across levels and party sizes
12. Replayability and variety
13. Lineage and influence of earlier systems and editions
14. Accessibility for new players and game masters

Provide comprehensive analysis while maintaining a professional and insightful tone. Include specific examples and references where relevant.";

pub const CHARACTER_SYSTEM: &str = "You are an expert in RPG character analysis and optimization.";

/// Base system prompt for a genre.
pub fn analysis_system_prompt(genre: Genre) -> &'static str {
    match genre {
        Genre::ScienceFiction => SF_SYSTEM,
        Genre::Comics => COMICS_SYSTEM,
        Genre::Rpg => RPG_SYSTEM,
    }
}

/// Enhanced system prompt for a genre, without the work details.
pub fn enhanced_system_prompt(genre: Genre) -> &'static str {
    match genre {
        Genre::ScienceFiction => SF_SYSTEM_ENHANCED,
        Genre::Comics => COMICS_SYSTEM_ENHANCED,
        Genre::Rpg => RPG_SYSTEM_ENHANCED,
    }
}

/// Prompt used by the original analysis pipeline.
pub fn analysis_prompt(genre: Genre, request: &AnalysisRequest) -> Prompt {
    Prompt::new(analysis_system_prompt(genre), request.content.as_str())
}

/// Prompt used by the enhanced pipeline: the enhanced system prompt with
/// the known work details appended.
pub fn enhanced_analysis_prompt(genre: Genre, request: &AnalysisRequest) -> Prompt {
    let mut system = enhanced_system_prompt(genre).to_string();
    let details = [
        ("Title", request.title.as_deref()),
        ("Author", request.author.as_deref()),
        ("Creator", request.creator.as_deref()),
        ("Publisher", request.publisher.as_deref()),
        ("System", request.system.as_deref()),
        ("Edition", request.edition.as_deref()),
    ];
    for (label, value) in details {
        if let Some(v) = value.map(str::trim).filter(|v| !v.is_empty()) {
            system.push_str(&format!("\n{label}: {v}"));
        }
    }
    if let Some(year) = request.year {
        system.push_str(&format!("\nYear: {year}"));
    }
    Prompt::new(system, request.content.as_str())
}

/// Recommendation prompt for a genre.
pub fn recommendation_prompt(genre: Genre, based_on: &str, limit: u32) -> Prompt {
    let (system, subject, fields) = match genre {
        Genre::ScienceFiction => (
            "You are an expert in science fiction literature and media recommendations.",
            "science fiction works",
            "1. Title and author\n2. Brief description\n3. Why it might be of interest\n\
             4. Similar themes or elements\n5. Publication year",
        ),
        Genre::Comics => (
            "You are an expert in comics and graphic novel recommendations.",
            "comics or graphic novels",
            "1. Title and creator(s)\n2. Publisher\n3. Brief description\n\
             4. Why it might be of interest\n5. Similar themes or art style\n6. Publication year",
        ),
        Genre::Rpg => (
            "You are an expert in tabletop RPG recommendations.",
            "RPG systems, supplements, or adventures",
            "1. Title and publisher\n2. System/edition\n3. Brief description\n\
             4. Why it might be of interest\n5. Similar mechanics or themes\n6. Publication year",
        ),
    };
    let user = format!(
        "Based on the following content or preferences, recommend {limit} {subject} that would be of interest:\n\n\
         {based_on}\n\n\
         For each recommendation, provide:\n{fields}"
    );
    Prompt::new(system, user)
}

/// Prompt for `POST /analyze/character`.
pub fn character_prompt(system_name: &str, character_sheet: &str) -> Prompt {
    let user = format!(
        "Analyze this {system_name} character sheet:\n\n\
         {character_sheet}\n\n\
         Provide insights about:\n\
         1. Character concept and role\n\
         2. Strengths and weaknesses\n\
         3. Optimization and balance\n\
         4. Role-playing potential\n\
         5. Party synergy\n\
         6. Growth opportunities"
    );
    Prompt::new(CHARACTER_SYSTEM, user)
}

// ---------------------------------------------------------------------------
// Comparisons
// ---------------------------------------------------------------------------

const COMPARISON_SYSTEM: &str =
    "You are an expert in comparative literary analysis across science fiction, comics and games.";

struct ComparisonTemplate {
    expert: &'static str,
    subject: &'static str,
    base: &'static [&'static str],
    enhanced: &'static [&'static str],
}

fn comparison_template(kind: ComparisonType) -> ComparisonTemplate {
    match kind {
        ComparisonType::Themes => ComparisonTemplate {
            expert: "an expert in literary analysis",
            subject: "the themes and motifs in",
            base: &[
                "Core themes and their development",
                "Symbolism and allegory",
                "Philosophical implications",
                "Social commentary",
                "Moral questions",
            ],
            enhanced: &[
                "Core themes and their evolution",
                "Symbolic elements and their significance",
                "Philosophical underpinnings",
                "Social and cultural commentary",
                "Ethical dilemmas and moral questions",
                "Historical context and relevance",
                "Impact on the genre",
            ],
        },
        ComparisonType::WorldBuilding => ComparisonTemplate {
            expert: "a world-building expert",
            subject: "the world-building elements in",
            base: &[
                "Setting consistency and depth",
                "Cultural development",
                "Technological/magical systems",
                "Political structures",
                "Environmental factors",
            ],
            enhanced: &[
                "Setting consistency and depth",
                "Cultural systems and development",
                "Technological/magical frameworks",
                "Political and social structures",
                "Environmental and ecological factors",
                "Historical context and evolution",
                "Impact on the genre",
            ],
        },
        ComparisonType::Characters => ComparisonTemplate {
            expert: "a character analysis expert",
            subject: "the character development in",
            base: &[
                "Character arcs and growth",
                "Relationships and dynamics",
                "Motivations and conflicts",
                "Archetypes and roles",
                "Impact on the story",
            ],
            enhanced: &[
                "Character arcs and development",
                "Relationships and interpersonal dynamics",
                "Motivations and internal conflicts",
                "Archetypes and their subversion",
                "Impact on narrative and themes",
                "Historical and cultural context",
                "Influence on the genre",
            ],
        },
        ComparisonType::Plot => ComparisonTemplate {
            expert: "a narrative structure expert",
            subject: "the plot structure in",
            base: &[
                "Narrative techniques",
                "Pacing and tension",
                "Conflict resolution",
                "Story arcs",
                "Climax and resolution",
            ],
            enhanced: &[
                "Narrative techniques and style",
                "Pacing and tension building",
                "Conflict development and resolution",
                "Story arcs and their integration",
                "Climax and resolution effectiveness",
                "Historical context and influence",
                "Impact on the genre",
            ],
        },
        ComparisonType::Works => ComparisonTemplate {
            expert: "an expert in comparative analysis",
            subject: "and compare",
            base: &[
                "Similarities and differences in themes",
                "Writing style and narrative approach",
                "World-building and setting",
                "Character development",
                "Cultural and historical significance",
            ],
            enhanced: &[
                "Similarities and differences in themes",
                "Writing style and narrative approach",
                "World-building and setting",
                "Character development",
                "Cultural and historical significance",
                "Influence on later works",
                "Impact on the genre",
            ],
        },
    }
}

/// Render one work as `Title:`/`Author:`/`Year:`/`Content:` lines.
pub fn format_work(work: &WorkRef) -> String {
    let mut parts = Vec::with_capacity(4);
    if let Some(title) = &work.title {
        parts.push(format!("Title: {title}"));
    }
    if let Some(author) = &work.author {
        parts.push(format!("Author: {author}"));
    }
    if let Some(year) = work.year {
        parts.push(format!("Year: {year}"));
    }
    if let Some(content) = &work.content {
        parts.push(format!("Content: {content}"));
    }
    parts.join("\n")
}

/// Comparison prompt for the given aspect.
pub fn comparison_prompt(kind: ComparisonType, works: &[WorkRef], enhanced: bool) -> Prompt {
    let template = comparison_template(kind);
    let formatted = works.iter().map(format_work).collect::<Vec<_>>().join("\n\n");
    let points = if enhanced { template.enhanced } else { template.base };
    let numbered = points
        .iter()
        .enumerate()
        .map(|(i, p)| format!("{}. {p}", i + 1))
        .collect::<Vec<_>>()
        .join("\n");

    let user = if enhanced {
        format!(
            "As {}, examine {} these works:\n{formatted}\n\nConsider:\n{numbered}\n\n\
             Provide a comprehensive comparative analysis with specific examples.",
            template.expert, template.subject
        )
    } else {
        format!(
            "Analyze {} the following works:\n{formatted}\n\nFocus on:\n{numbered}\n\n\
             Provide a detailed comparative analysis.",
            template.subject
        )
    };
    Prompt::new(COMPARISON_SYSTEM, user)
}
