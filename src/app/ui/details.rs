use eframe::egui::{self, RichText, Ui};

use crate::util::count_label;

use super::super::ViewModel;

struct RelatedEntry {
    id: String,
    display_name: String,
    rel_type: String,
}

impl ViewModel {
    pub(in crate::app) fn draw_details(&mut self, ui: &mut Ui) {
        ui.heading("Selection Details");
        ui.add_space(6.0);

        let Some(node) = self.engine.selected_node() else {
            ui.label("Click a node to inspect it. Drag nodes to rearrange the graph.");
            return;
        };

        let node_id = node.id().to_owned();
        let display_name = node.display_name.clone();
        let kind = node.kind;
        let label = node.entity.label.clone();
        let properties = node.entity.properties.clone();
        let position = node.position;
        let pinned_at = self.engine.positions().get(&node_id);
        let (outgoing, incoming) = self.related_entries(&node_id);

        ui.label(RichText::new(display_name).strong().color(kind.fill()));
        ui.small(node_id.as_str());
        ui.add_space(6.0);

        ui.label(format!("Label: {label}"));
        ui.label(format!("Position: ({:.0}, {:.0})", position.x, position.y));
        ui.horizontal(|ui| {
            ui.label(match pinned_at {
                Some(_) => "Pinned by drag",
                None => "Grid placement",
            });
            if ui
                .add_enabled(pinned_at.is_some(), egui::Button::new("Reset position"))
                .clicked()
            {
                self.engine.reset_position(&node_id);
            }
        });

        ui.separator();
        ui.label(RichText::new("Properties").strong());
        if properties.is_empty() {
            ui.label("No properties.");
        } else {
            egui::Grid::new("entity_properties")
                .num_columns(2)
                .striped(true)
                .show(ui, |ui| {
                    for (key, value) in &properties {
                        ui.label(key.as_str());
                        ui.label(value.as_str());
                        ui.end_row();
                    }
                });
        }

        let mut picked = None;

        ui.separator();
        ui.label(
            RichText::new(format!(
                "Outgoing ({})",
                count_label(outgoing.len() as u64, "relationship", "relationships")
            ))
            .strong(),
        );
        for entry in &outgoing {
            if ui
                .link(format!("{} -> {}", entry.rel_type, entry.display_name))
                .on_hover_text(entry.id.as_str())
                .clicked()
            {
                picked = Some(entry.id.clone());
            }
        }

        ui.separator();
        ui.label(
            RichText::new(format!(
                "Incoming ({})",
                count_label(incoming.len() as u64, "relationship", "relationships")
            ))
            .strong(),
        );
        for entry in &incoming {
            if ui
                .link(format!("{} <- {}", entry.rel_type, entry.display_name))
                .on_hover_text(entry.id.as_str())
                .clicked()
            {
                picked = Some(entry.id.clone());
            }
        }

        if picked.is_some() {
            self.engine.select(picked);
        }
    }

    fn related_entries(&self, node_id: &str) -> (Vec<RelatedEntry>, Vec<RelatedEntry>) {
        let scene = self.engine.scene();
        let Some(index) = scene.index_of(node_id) else {
            return (Vec::new(), Vec::new());
        };

        let mut outgoing = Vec::new();
        let mut incoming = Vec::new();
        for edge in scene.edges() {
            let (other, bucket) = if edge.source == index {
                (scene.target(edge), &mut outgoing)
            } else if edge.target == index {
                (scene.source(edge), &mut incoming)
            } else {
                continue;
            };
            bucket.push(RelatedEntry {
                id: other.id().to_owned(),
                display_name: other.display_name.clone(),
                rel_type: edge.relationship.rel_type.clone(),
            });
        }
        (outgoing, incoming)
    }
}
