//! Test data builders for creating test objects

use actorgraph_rs::{ActorFactory, ActorSystem, AppConfig};

/// Builder for capability text
#[derive(Default)]
pub struct CapabilityBuilder {
    data: Vec<String>,
    inputs: Vec<(String, String)>,
    outputs: Vec<(String, String)>,
}

impl CapabilityBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a `data` entry; `fields` are `(key, value)` pairs after name and type.
    pub fn data(mut self, name: &str, kind: &str, fields: &[(&str, &str)]) -> Self {
        let mut entry = format!(
            "    data\n        name = \"{}\"\n        type = \"{}\"\n",
            name, kind
        );
        for (key, value) in fields {
            entry.push_str(&format!("        {} = \"{}\"\n", key, value));
        }
        self.data.push(entry);
        self
    }

    pub fn input(mut self, slot_type: &str, name: &str) -> Self {
        self.inputs.push((slot_type.to_string(), name.to_string()));
        self
    }

    pub fn output(mut self, slot_type: &str, name: &str) -> Self {
        self.outputs.push((slot_type.to_string(), name.to_string()));
        self
    }

    pub fn build(self) -> String {
        let mut text = String::new();
        if !self.data.is_empty() {
            text.push_str("capabilities\n");
            for entry in &self.data {
                text.push_str(entry);
            }
        }
        for (section, entry, slots) in [
            ("inputs", "input", &self.inputs),
            ("outputs", "output", &self.outputs),
        ] {
            if slots.is_empty() {
                continue;
            }
            text.push_str(section);
            text.push('\n');
            for (slot_type, name) in slots {
                text.push_str(&format!(
                    "    {}\n        type = \"{}\"\n        name = \"{}\"\n",
                    entry, slot_type, name
                ));
            }
        }
        text
    }
}

/// Builder for an actor system with test-friendly defaults
pub struct SystemBuilder {
    config: AppConfig,
    factory: ActorFactory,
}

impl SystemBuilder {
    pub fn new() -> Self {
        let mut config = AppConfig::default();
        config.runtime.timer_interval_ms = 5;
        Self {
            config,
            factory: ActorFactory::with_builtins(),
        }
    }

    pub fn timer_ms(mut self, ms: u64) -> Self {
        self.config.runtime.timer_interval_ms = ms;
        self
    }

    pub fn mailbox_capacity(mut self, capacity: usize) -> Self {
        self.config.runtime.mailbox_capacity = capacity;
        self
    }

    pub fn with_factory(mut self, factory: ActorFactory) -> Self {
        self.factory = factory;
        self
    }

    pub fn build(self) -> ActorSystem {
        ActorSystem::new(self.config, self.factory)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use actorgraph_rs::CapabilityDescriptor;

    #[test]
    fn test_capability_builder() {
        let text = CapabilityBuilder::new()
            .data("gain", "float", &[("min", "0"), ("max", "1")])
            .input("OSC", "osc-in")
            .output("OSC", "osc-out")
            .build();

        let desc = CapabilityDescriptor::from_text(Some(&text)).unwrap();
        assert_eq!(desc.parameters().len(), 1);
        assert_eq!(desc.input_slots()[0].label, "osc-in");
        assert_eq!(desc.output_slots()[0].label, "osc-out");
    }
}
