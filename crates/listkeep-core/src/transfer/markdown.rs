//! Markdown rendering.
//!
//! [`render_list`] writes the template that
//! [`parse_foreign_text`](super::parse_foreign_text) reads back: a `# name`
//! title followed by `## Descrição`, `## Itens` and `## Metadados`
//! sections. Notes render as plain markdown and are not re-importable.

use std::fmt::Write as _;

use super::ExportEnvelope;
use crate::models::{Item, List, Note};

pub(crate) const DESCRIPTION_HEADING: &str = "## Descrição";
pub(crate) const ITEMS_HEADING: &str = "## Itens";
pub(crate) const METADATA_HEADING: &str = "## Metadados";

fn yes_no(value: bool) -> &'static str {
    if value {
        "Sim"
    } else {
        "Não"
    }
}

fn render_item(list: &List, item: &Item) -> String {
    let mut line = item.text.trim().to_string();
    let description = item
        .description
        .as_deref()
        .map(str::trim)
        .filter(|d| !d.is_empty());
    let category = item
        .category
        .as_ref()
        .and_then(|id| list.category(id))
        .map(|category| category.name.trim())
        .filter(|name| !name.is_empty());

    // Text ending in a bracket would be read back as a description or
    // category, so both slots are written out, empty if need be
    let explicit = line.ends_with([')', ']']);
    if explicit || description.is_some() {
        let _ = write!(line, " ({})", description.unwrap_or_default());
    }
    if explicit || category.is_some() {
        let _ = write!(line, " [{}]", category.unwrap_or_default());
    }
    line
}

/// Render a list in the re-importable markdown template.
#[must_use]
pub fn render_list(list: &List) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {}", list.name.trim());

    if let Some(description) = list.description.as_deref().filter(|d| !d.trim().is_empty()) {
        let _ = writeln!(output);
        let _ = writeln!(output, "{DESCRIPTION_HEADING}");
        for line in description.lines() {
            // A heading inside the description would end the section early
            let _ = writeln!(output, "{}", line.trim_start_matches('#').trim_start());
        }
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{ITEMS_HEADING}");
    for (index, item) in list.items.iter().enumerate() {
        let _ = writeln!(output, "{}. {}", index + 1, render_item(list, item));
    }

    let _ = writeln!(output);
    let _ = writeln!(output, "{METADATA_HEADING}");
    if let Some(color) = list.color.as_deref() {
        let _ = writeln!(output, "- Cor: {color}");
    }
    if !list.categories.is_empty() {
        let names = list
            .categories
            .iter()
            .map(|category| category.name.trim())
            .collect::<Vec<_>>()
            .join(", ");
        let _ = writeln!(output, "- Categorias: {names}");
    }
    let _ = writeln!(
        output,
        "- Seleção Aleatória: {}",
        yes_no(list.allows_random_pick)
    );
    if let Some(kind) = list.animation_kind {
        let _ = writeln!(output, "- Tipo de Animação: {}", kind.template_label());
    }

    output
}

/// Render a note as a markdown document.
#[must_use]
pub fn render_note(note: &Note) -> String {
    let mut output = String::new();
    let _ = writeln!(output, "# {}", note.title.trim());
    if let Some(tags) = note.tags.as_ref().filter(|tags| !tags.is_empty()) {
        let _ = writeln!(output);
        let rendered = tags
            .iter()
            .map(|tag| format!("#{}", tag.trim_start_matches('#')))
            .collect::<Vec<_>>()
            .join(" ");
        let _ = writeln!(output, "{rendered}");
    }
    if !note.plain_text.trim().is_empty() {
        let _ = writeln!(output);
        output.push_str(note.plain_text.trim_end());
        output.push('\n');
    }
    output
}

/// Render a whole export as one markdown document.
///
/// Lists come first, then notes, separated by `---` rules. Each list
/// section is a complete template and can be imported on its own.
#[must_use]
pub fn render_export(envelope: &ExportEnvelope) -> String {
    let sections = envelope
        .lists
        .iter()
        .map(render_list)
        .chain(envelope.notes.iter().map(render_note))
        .collect::<Vec<_>>();
    sections.join("\n---\n\n")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AnimationKind, Category, ListDraft, NoteDraft};
    use pretty_assertions::assert_eq;

    #[test]
    fn render_list_writes_every_section() {
        let category = Category::new("Proteínas");
        let mut ovos = Item::new("Ovos");
        ovos.category = Some(category.id.clone());
        let mut pao = Item::new("Pão");
        pao.description = Some("integral".to_string());

        let list = ListDraft {
            description: Some("Semana".to_string()),
            color: Some("#FF0000".to_string()),
            items: vec![Item::new("Leite"), pao, ovos],
            categories: vec![category],
            allows_random_pick: true,
            animation_kind: Some(AnimationKind::Cube),
            ..ListDraft::new("Compras")
        }
        .into_list();

        let expected = "# Compras\n\
            \n\
            ## Descrição\n\
            Semana\n\
            \n\
            ## Itens\n\
            1. Leite\n\
            2. Pão (integral)\n\
            3. Ovos [Proteínas]\n\
            \n\
            ## Metadados\n\
            - Cor: #FF0000\n\
            - Categorias: Proteínas\n\
            - Seleção Aleatória: Sim\n\
            - Tipo de Animação: cubo\n";
        assert_eq!(render_list(&list), expected);
    }

    #[test]
    fn render_list_skips_dangling_category() {
        let mut item = Item::new("Ovos");
        item.category = Some("gone".into());
        let list = ListDraft {
            items: vec![item],
            ..ListDraft::new("Compras")
        }
        .into_list();

        let rendered = render_list(&list);
        assert!(rendered.contains("1. Ovos\n"));
        assert!(rendered.contains("- Seleção Aleatória: Não\n"));
        assert!(!rendered.contains("## Descrição"));
    }

    #[test]
    fn render_note_includes_tags_and_text() {
        let note = NoteDraft {
            tags: Some(vec!["casa".to_string()]),
            ..NoteDraft::new("Ideias", "pintar a sala\n")
        }
        .into_note();

        assert_eq!(render_note(&note), "# Ideias\n\n#casa\n\npintar a sala\n");
    }
}
