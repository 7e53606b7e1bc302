use super::descriptor::FuDescriptor;
use super::instance::FuInstance;
use std::collections::HashMap;

/// A factory used to construct functional unit instances.
/// Instance ids are handed out in creation order, so the first
/// descriptor gets the lowest ids.
pub struct Factory {
    next_id: usize,
    index: HashMap<String, usize>,
}

impl Factory {
    pub fn new() -> Self {
        Self {
            next_id: 0,
            index: HashMap::new(),
        }
    }
    /// Generate one instance of the descriptor at `desc_idx`.
    pub fn new_unit(&mut self, desc_idx: usize, desc: &FuDescriptor) -> FuInstance {
        let replica = if let Some(i) = self.index.get_mut(desc.name()) {
            *i += 1;
            *i
        } else {
            self.index.insert(desc.name().to_string(), 0);
            0
        };
        let id = self.next_id;
        self.next_id += 1;
        FuInstance::new(id, format!("{}{}", desc.name(), replica), desc_idx)
    }
    /// Generate every replica of the descriptor at `desc_idx`.
    pub fn new_units(&mut self, desc_idx: usize, desc: &FuDescriptor) -> Vec<FuInstance> {
        (0..desc.replicas())
            .map(|_| self.new_unit(desc_idx, desc))
            .collect()
    }
}
