//! Debug parameter panel.
//!
//! A panel is a list of folders, each holding controls bound to one numeric
//! field of one scene node. It is drawn as an egui window with one collapsing
//! header per folder and one slider per control. Moving a slider writes the
//! field right away; the declared range only bounds the slider.

use crate::data_structures::scene_graph::{NodeHandle, NodeKind, Scene};

/// Numeric node field a control writes to.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Field {
    LightIntensity,
    PositionX,
    PositionY,
    PositionZ,
    ScaleX,
    ScaleY,
    ScaleZ,
}

impl Field {
    pub fn read(self, scene: &Scene, target: NodeHandle) -> Option<f32> {
        let node = scene.get(target)?;
        let t = &node.transform;
        Some(match self {
            Field::LightIntensity => match &node.kind {
                NodeKind::Light(light) => light.intensity,
                _ => return None,
            },
            Field::PositionX => t.position.x,
            Field::PositionY => t.position.y,
            Field::PositionZ => t.position.z,
            Field::ScaleX => t.scale.x,
            Field::ScaleY => t.scale.y,
            Field::ScaleZ => t.scale.z,
        })
    }

    pub fn write(self, scene: &mut Scene, target: NodeHandle, value: f32) -> bool {
        let Some(node) = scene.get_mut(target) else {
            return false;
        };
        if self == Field::LightIntensity {
            return match node.light_mut() {
                Some(light) => {
                    light.intensity = value;
                    true
                }
                None => false,
            };
        }
        let t = &mut node.transform;
        match self {
            Field::LightIntensity => {}
            Field::PositionX => t.position.x = value,
            Field::PositionY => t.position.y = value,
            Field::PositionZ => t.position.z = value,
            Field::ScaleX => t.scale.x = value,
            Field::ScaleY => t.scale.y = value,
            Field::ScaleZ => t.scale.z = value,
        }
        true
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Control {
    pub label: String,
    pub target: NodeHandle,
    pub field: Field,
    pub min: f32,
    pub max: f32,
}

impl Control {
    /// A slider over `[min, max]`.
    pub fn new(label: &str, target: NodeHandle, field: Field, min: f32, max: f32) -> Self {
        Self {
            label: label.to_string(),
            target,
            field,
            min,
            max,
        }
    }

    pub fn value(&self, scene: &Scene) -> Option<f32> {
        self.field.read(scene, self.target)
    }

    /// One slider row. Returns whether the field was written.
    fn show(&self, ui: &mut egui::Ui, scene: &mut Scene) -> bool {
        let Some(mut value) = self.value(scene) else {
            ui.label(format!("{} (missing)", self.label));
            return false;
        };
        let slider = egui::Slider::new(&mut value, self.min..=self.max).text(self.label.as_str());
        ui.add(slider).changed() && self.field.write(scene, self.target, value)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Folder {
    pub name: String,
    pub controls: Vec<Control>,
}

impl Folder {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            controls: Vec::new(),
        }
    }

    pub fn with(mut self, control: Control) -> Self {
        self.controls.push(control);
        self
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Panel {
    folders: Vec<Folder>,
}

impl Panel {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_folder(mut self, folder: Folder) -> Self {
        self.folders.push(folder);
        self
    }

    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    pub fn folder(&self, name: &str) -> Option<&Folder> {
        self.folders.iter().find(|f| f.name == name)
    }

    /// All controls in display order, with their folder name.
    pub fn controls(&self) -> impl Iterator<Item = (&str, &Control)> {
        self.folders
            .iter()
            .flat_map(|f| f.controls.iter().map(move |c| (f.name.as_str(), c)))
    }

    pub fn len(&self) -> usize {
        self.folders.iter().map(|f| f.controls.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn control(&self, index: usize) -> Option<(&str, &Control)> {
        self.controls().nth(index)
    }

    /// Writes `value` to the field bound by control `index`. The range is not
    /// enforced.
    pub fn set(&self, scene: &mut Scene, index: usize, value: f32) -> bool {
        match self.control(index) {
            Some((_, control)) => control.field.write(scene, control.target, value),
            None => false,
        }
    }

    pub fn get(&self, scene: &Scene, index: usize) -> Option<f32> {
        self.control(index)?.1.value(scene)
    }

    /// Draws the panel as a window in the top-left corner. Returns the index
    /// of the control moved this frame.
    pub fn show(&self, ctx: &egui::Context, scene: &mut Scene) -> Option<usize> {
        let mut moved = None;
        egui::Window::new("Controls")
            .anchor(egui::Align2::LEFT_TOP, [8.0, 8.0])
            .resizable(false)
            .show(ctx, |ui| {
                let mut index = 0;
                for folder in &self.folders {
                    egui::CollapsingHeader::new(folder.name.as_str())
                        .default_open(true)
                        .show(ui, |ui| {
                            for (offset, control) in folder.controls.iter().enumerate() {
                                if control.show(ui, scene) {
                                    moved = Some(index + offset);
                                }
                            }
                        });
                    index += folder.controls.len();
                }
            });
        if let Some((folder, control)) = moved.and_then(|i| self.control(i)) {
            if let Some(value) = control.value(scene) {
                log::debug!("{}/{} = {:.2}", folder, control.label, value);
            }
        }
        moved
    }
}
