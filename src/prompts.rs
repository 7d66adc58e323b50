// src/prompts.rs
//! Static prompt text and the style/element vocabulary.

use serde::Serialize;

pub const PERSONA: &str = r#"You are "Garden AI Designer", a landscape and garden design consultant with twenty years of experience.

## YOUR ROLE
You help clients picture and plan the garden of their dreams. When the client uploads a photo you analyse it and suggest improvements.

## CONVERSATION FLOW
1. Welcome: greet the client and ask for a photo of their garden.
2. Analysis: when a photo arrives, describe what you see and ask what they would like to change.
3. Requirements: ask about
   - the style (Modern, Mediterranean, Tropical, Zen, English, Contemporary)
   - elements to add (pool, lawn, plants, paths, lighting, pergola, fountain, barbecue area, seating)
   - what to PRESERVE (the house, specific trees, walls)
4. Confirmation: summarise the request. Renderings are produced automatically once a style and at least one element are known, so tell the client the rendering is on its way.
5. Feedback: after a rendering, invite specific changes such as "add more flowers".

## TONE
- Professional but friendly
- One question at a time
- Suggest ideas based on the photo

## IMPORTANT
- NEVER modify architectural structures (house, foundations)
- You may change: garden, lawn, plants, paths, lighting, exterior wall colour, fences
- ALWAYS preserve the house and the main structures"#;

pub const ANALYSIS_REQUEST: &str = r#"Analyse this photo of an outdoor space or garden.

Return a structured description with:
1. EXISTING ELEMENTS: what is there now (house, lawn, trees, paving, ...)
2. CONDITION: current state of the garden (well kept, neglected, partly developed)
3. ESTIMATED SIZE: approximate area
4. EXPOSURE: visible sun orientation
5. HOUSE STYLE: architectural style of the building, if visible
6. POTENTIAL: what could be improved or added
7. ELEMENTS TO PRESERVE: what should be kept

Finish by asking which style the client prefers: Modern, Mediterranean, Tropical, Zen, English or Contemporary."#;

/// Placeholder sent instead of images that fall outside the inline budget.
pub const IMAGE_OMITTED: &str = "[earlier photo omitted]";

/// Structural categories the image model must leave untouched.
pub const PRESERVED_STRUCTURES: &[&str] = &[
    "the main house or building (shape, walls, proportions)",
    "windows and doors",
    "the roof",
    "foundations and architectural structures",
];

/// Landscape categories the image model may change.
pub const EDITABLE_LANDSCAPE: &[&str] = &[
    "lawn",
    "plants and trees",
    "pools",
    "paths",
    "lighting",
    "fences",
    "exterior wall colour",
];

pub const DEFAULT_LIGHTING: &str = "golden hour, late afternoon";

pub const WELCOME: &str = "Welcome to Garden Design AI!\n\n\
I'm your personal consultant for transforming your outdoor space.\n\n\
How it works:\n\
1. Upload a photo of your current garden or yard\n\
2. Tell me what you'd like to change\n\
3. I'll generate a photorealistic rendering of the new design\n\n\
Important: I only change the garden and the landscape. \
Your house and its structures stay exactly as they are.\n\n\
To begin, upload a photo of your outdoor space.";

pub const RENDERING_READY: &str = "Here is the rendering of your new garden! \
The house and structures are unchanged; only the landscape was transformed.";

pub const REFINEMENT_READY: &str = "Here is the updated rendering.";

pub const AFTER_RENDERING_HINT: &str = "What next?\n\
- Ask for specific changes (e.g. \"add more flowers\", \"make the pool rectangular\")\n\
- Say \"regenerate\" for a fresh rendering\n\
- Upload a new photo to start another project";

/// Canned opening message offered by the chat widget.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Starter {
    pub label: &'static str,
    pub message: &'static str,
}

pub const STARTERS: &[Starter] = &[
    Starter {
        label: "I want a pool",
        message: "I'd like to add a beautiful pool to my garden",
    },
    Starter {
        label: "Green garden",
        message: "I'd like a garden with lots of greenery, a lawn and plants",
    },
    Starter {
        label: "Tropical style",
        message: "I'd love a tropical style with palm trees",
    },
    Starter {
        label: "Zen garden",
        message: "I'd like a relaxing Japanese zen garden",
    },
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Style {
    Modern,
    Mediterranean,
    Tropical,
    Zen,
    English,
    Contemporary,
}

impl Style {
    pub const ALL: [Style; 6] = [
        Style::Modern,
        Style::Mediterranean,
        Style::Tropical,
        Style::Zen,
        Style::English,
        Style::Contemporary,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Style::Modern => "Modern",
            Style::Mediterranean => "Mediterranean",
            Style::Tropical => "Tropical",
            Style::Zen => "Zen",
            Style::English => "English",
            Style::Contemporary => "Contemporary",
        }
    }

    /// Lower-case words that select this style.
    pub fn keywords(&self) -> &'static [&'static str] {
        match self {
            Style::Modern => &["modern", "minimalist", "minimal", "clean lines"],
            Style::Mediterranean => &["mediterranean", "italian", "tuscan", "provencal"],
            Style::Tropical => &["tropical", "exotic", "palm", "jungle"],
            Style::Zen => &["zen", "japanese", "oriental", "asian"],
            Style::English => &["english", "cottage", "romantic"],
            Style::Contemporary => &["contemporary", "outdoor living", "fire pit", "outdoor kitchen"],
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Style::Modern => {
                "modern and minimalist with clean lines, contemporary materials such as concrete and corten steel, architectural plants"
            }
            Style::Mediterranean => {
                "warm Mediterranean with terracotta, olive trees, lavender, wooden pergolas, natural gravel"
            }
            Style::Tropical => {
                "lush tropical with palms, exotic plants, a natural pool, exotic wood"
            }
            Style::Zen => {
                "Japanese zen with raked gravel, moss, stone lanterns, bamboo, water"
            }
            Style::English => {
                "romantic English garden with roses, flowering borders, green lawn, arches"
            }
            Style::Contemporary => {
                "contemporary outdoor living with an outdoor kitchen, fire pit, built-in seating"
            }
        }
    }
}

/// A landscape element the user can ask for, with the words that name it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Element {
    pub label: &'static str,
    pub keywords: &'static [&'static str],
}

pub const ELEMENTS: &[Element] = &[
    Element {
        label: "swimming pool",
        keywords: &["pool", "swimming"],
    },
    Element {
        label: "green lawn",
        keywords: &["lawn", "grass", "turf"],
    },
    Element {
        label: "natural stone path",
        keywords: &["path", "walkway", "footpath", "stepping stone"],
    },
    Element {
        label: "pergola with climbing plants",
        keywords: &["pergola", "gazebo", "canopy"],
    },
    Element {
        label: "plants and flowers",
        keywords: &["plant", "flower", "tree", "hedge", "shrub", "greenery"],
    },
    Element {
        label: "garden lighting",
        keywords: &["lighting", "lights", "lamp", "lantern"],
    },
    Element {
        label: "decorative fountain",
        keywords: &["fountain", "water feature", "waterfall", "pond"],
    },
    Element {
        label: "barbecue area",
        keywords: &["bbq", "barbecue", "grill"],
    },
    Element {
        label: "relaxation area with seating",
        keywords: &["seating", "seats", "bench", "sofa", "lounge", "relax"],
    },
    Element {
        label: "fence",
        keywords: &["fence", "fencing"],
    },
];

/// Instruction for the first rendering of a project.
pub fn rendering_instruction(
    style: Style,
    elements: &[&str],
    excluded: &[&str],
    lighting: &str,
) -> String {
    let additions = if elements.is_empty() {
        "- a general improvement of the landscape".to_string()
    } else {
        bullet_list(elements)
    };
    let exclusions = if excluded.is_empty() {
        String::new()
    } else {
        format!(
            "\n### The client explicitly does NOT want:\n{}\n",
            bullet_list(excluded)
        )
    };

    format!(
        r#"Edit this photo of a garden or outdoor space.

## ABSOLUTE RULES

### 1. ADD ONLY THESE ELEMENTS (NOTHING ELSE):
{additions}
{exclusions}
### 2. NEVER ADD:
- fountains, gazebos, pergolas or barbecue areas unless listed above
- extra outdoor furniture that was not requested
- decorative elements that were not specified

### 3. STYLE: {style}

### 4. QUALITY: professional photorealistic rendering, natural lighting ({lighting})

Transform this garden into a {description} outdoor space.
The result must look like a professional photograph taken with a full-frame camera.

## FINAL INSTRUCTIONS
1. Add ONLY the elements listed in section 1
2. Do not invent extra elements; follow the list literally
3. The result must look like a real photograph"#,
        style = style.name(),
        description = style.description(),
    )
}

/// Instruction for an iterative edit of the latest rendering.
pub fn refinement_instruction(feedback: &str) -> String {
    format!(
        r#"Edit this garden image according to the following feedback:

{feedback}

IMPORTANT:
- Keep ALL other elements unchanged
- Change ONLY what the feedback asks for
- The result must be photorealistic"#
    )
}

/// Fixed constraint appended to every image request.
pub fn preservation_constraint() -> String {
    format!(
        "PRESERVE WITHOUT ANY CHANGE:\n{}\n\nYou may only modify landscape elements: {}.\nThe house MUST remain IDENTICAL.",
        bullet_list(PRESERVED_STRUCTURES),
        EDITABLE_LANDSCAPE.join(", ")
    )
}

fn bullet_list(items: &[&str]) -> String {
    items
        .iter()
        .map(|item| format!("- {item}"))
        .collect::<Vec<_>>()
        .join("\n")
}
