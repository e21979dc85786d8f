//! Per-language prompt table for the explanation backend
//!
//! Keyed by language family (`es` for `es-ES`, `es-MX`, ...). Unknown
//! families use the English entry.

use std::borrow::Cow;

/// One system/user prompt pair plus the answer used when the backend says nothing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PromptTemplate {
    pub system: &'static str,
    /// `{placeholder}` template, see [`render`]
    pub user: &'static str,
    pub default_response: &'static str,
}

/// Prompts for one language family
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LanguagePrompts {
    pub family: &'static str,
    pub explain: PromptTemplate,
    pub follow_up: PromptTemplate,
}

pub const FALLBACK_FAMILY: &str = "en";

static PROMPTS: &[LanguagePrompts] = &[
    LanguagePrompts {
        family: "en",
        explain: PromptTemplate {
            system: "You evaluate spoken answers to flashcards. \
                Provide a brief explanation of what was wrong, if anything. \
                If the answer is correct, respond with an empty string or just say it's correct. \
                Understand we are using TTS and acronyms often will be wrong. If the acronym is close say nothing. \
                The focus is that the user covers what is in the flashcard and understands the concept. Do not nitpick the answer. \
                Keep explanations concise. Unless absolutely necessary your feedback should be limited to a few sentences.",
            user: "Question: {question}\n\
                Reference answer: {reference}\n\
                Spoken transcript: {transcript}\n\
                Briefly explain what was incorrect about this answer, if anything. If correct, just say it's correct.",
            default_response: "Correct.",
        },
        follow_up: PromptTemplate {
            system: "You answer follow-up questions about flashcards. \
                Be brief and direct. Use the card context provided.",
            user: "Card front: {question}\n\
                Card back (reference): {reference}\n\
                User question: {user_question}\n\
                Provide a brief answer (1-3 sentences).",
            default_response: "I don't have an answer.",
        },
    },
    LanguagePrompts {
        family: "es",
        explain: PromptTemplate {
            system: "Evalúas respuestas habladas a tarjetas de estudio. \
                Explica brevemente qué estuvo mal, si algo lo estuvo. \
                Si la respuesta es correcta, di simplemente que es correcta. \
                La transcripción viene de reconocimiento de voz y las siglas pueden salir mal; si se parecen, no digas nada. \
                Lo importante es que el usuario cubra el contenido de la tarjeta y entienda el concepto. No seas quisquilloso. \
                Responde en español y en pocas frases.",
            user: "Pregunta: {question}\n\
                Respuesta de referencia: {reference}\n\
                Transcripción hablada: {transcript}\n\
                Explica brevemente qué fue incorrecto en esta respuesta, si algo. Si es correcta, di que es correcta.",
            default_response: "Correcto.",
        },
        follow_up: PromptTemplate {
            system: "Respondes preguntas de seguimiento sobre tarjetas de estudio. \
                Sé breve y directo. Usa el contexto de la tarjeta. Responde en español.",
            user: "Anverso de la tarjeta: {question}\n\
                Reverso (referencia): {reference}\n\
                Pregunta del usuario: {user_question}\n\
                Da una respuesta breve (1-3 frases).",
            default_response: "No tengo una respuesta.",
        },
    },
    LanguagePrompts {
        family: "fr",
        explain: PromptTemplate {
            system: "Tu évalues des réponses orales à des cartes mémoire. \
                Explique brièvement ce qui était faux, le cas échéant. \
                Si la réponse est correcte, dis simplement qu'elle est correcte. \
                La transcription vient de la reconnaissance vocale et les sigles peuvent être mal transcrits ; s'ils sont proches, ne dis rien. \
                L'essentiel est que l'utilisateur couvre le contenu de la carte et comprenne le concept. Ne sois pas pointilleux. \
                Réponds en français, en quelques phrases.",
            user: "Question : {question}\n\
                Réponse de référence : {reference}\n\
                Transcription orale : {transcript}\n\
                Explique brièvement ce qui était incorrect dans cette réponse, le cas échéant. Si elle est correcte, dis-le.",
            default_response: "Correct.",
        },
        follow_up: PromptTemplate {
            system: "Tu réponds aux questions de suivi sur des cartes mémoire. \
                Sois bref et direct. Utilise le contexte de la carte. Réponds en français.",
            user: "Recto de la carte : {question}\n\
                Verso (référence) : {reference}\n\
                Question de l'utilisateur : {user_question}\n\
                Donne une réponse brève (1 à 3 phrases).",
            default_response: "Je n'ai pas de réponse.",
        },
    },
    LanguagePrompts {
        family: "de",
        explain: PromptTemplate {
            system: "Du bewertest gesprochene Antworten auf Karteikarten. \
                Erkläre kurz, was falsch war, falls etwas falsch war. \
                Wenn die Antwort richtig ist, sag einfach, dass sie richtig ist. \
                Die Transkription stammt aus Spracherkennung, Abkürzungen können falsch erkannt sein; wenn sie ähnlich sind, sag nichts dazu. \
                Wichtig ist, dass der Nutzer den Inhalt der Karte abdeckt und das Konzept versteht. Sei nicht kleinlich. \
                Antworte auf Deutsch in wenigen Sätzen.",
            user: "Frage: {question}\n\
                Referenzantwort: {reference}\n\
                Gesprochenes Transkript: {transcript}\n\
                Erkläre kurz, was an dieser Antwort falsch war, falls etwas. Wenn sie richtig ist, sag, dass sie richtig ist.",
            default_response: "Richtig.",
        },
        follow_up: PromptTemplate {
            system: "Du beantwortest Folgefragen zu Karteikarten. \
                Sei kurz und direkt. Nutze den Kontext der Karte. Antworte auf Deutsch.",
            user: "Vorderseite: {question}\n\
                Rückseite (Referenz): {reference}\n\
                Frage des Nutzers: {user_question}\n\
                Gib eine kurze Antwort (1-3 Sätze).",
            default_response: "Darauf habe ich keine Antwort.",
        },
    },
];

/// `es-ES` → `es`, `PT_br` → `pt`, blank → `en`
pub fn language_family(language: &str) -> String {
    let family = language
        .trim()
        .split(['-', '_'])
        .next()
        .unwrap_or_default()
        .to_ascii_lowercase();
    if family.is_empty() {
        FALLBACK_FAMILY.to_string()
    } else {
        family
    }
}

/// Prompts for a language code, falling back to English
pub fn prompts_for(language: &str) -> &'static LanguagePrompts {
    let family = language_family(language);
    PROMPTS
        .iter()
        .find(|p| p.family == family)
        .or_else(|| PROMPTS.iter().find(|p| p.family == FALLBACK_FAMILY))
        .unwrap_or(&PROMPTS[0])
}

/// Families with a dedicated entry
pub fn supported_families() -> impl Iterator<Item = &'static str> {
    PROMPTS.iter().map(|p| p.family)
}

/// Substitute `{name}` placeholders in one pass.
///
/// Substituted values are never rescanned, so a transcript containing
/// `{reference}` stays literal. Unknown placeholders are left untouched.
pub fn render<'a>(template: &'a str, values: &[(&str, &str)]) -> Cow<'a, str> {
    if !template.contains('{') {
        return Cow::Borrowed(template);
    }

    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let replacement = after.find('}').and_then(|end| {
            let name = &after[..end];
            values
                .iter()
                .find(|(key, _)| *key == name)
                .map(|(_, value)| (*value, end))
        });
        match replacement {
            Some((value, end)) => {
                out.push_str(value);
                rest = &after[end + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}
