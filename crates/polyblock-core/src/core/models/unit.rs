use super::block::PolymerBlock;
use super::monomer::MonomerTemplate;
use super::port::{Port, PortLabel};
use super::system::MolecularSystem;
use std::sync::Arc;

/// Anything that can be placed into a chain: a structure plus its two named ports.
pub trait Attachable {
    fn name(&self) -> &str;

    fn system(&self) -> &MolecularSystem;

    fn port(&self, label: PortLabel) -> Option<&Port>;

    fn port_count(&self) -> usize {
        [PortLabel::Up, PortLabel::Down]
            .into_iter()
            .filter(|&label| self.port(label).is_some())
            .count()
    }
}

impl Attachable for MonomerTemplate {
    fn name(&self) -> &str {
        MonomerTemplate::name(self)
    }

    fn system(&self) -> &MolecularSystem {
        MonomerTemplate::system(self)
    }

    fn port(&self, label: PortLabel) -> Option<&Port> {
        Some(match label {
            PortLabel::Up => self.up(),
            PortLabel::Down => self.down(),
        })
    }
}

impl Attachable for PolymerBlock {
    fn name(&self) -> &str {
        PolymerBlock::name(self)
    }

    fn system(&self) -> &MolecularSystem {
        PolymerBlock::system(self)
    }

    fn port(&self, label: PortLabel) -> Option<&Port> {
        match label {
            PortLabel::Up => self.up(),
            PortLabel::Down => self.down(),
        }
    }
}

impl<T: Attachable + ?Sized> Attachable for &T {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn system(&self) -> &MolecularSystem {
        (**self).system()
    }

    fn port(&self, label: PortLabel) -> Option<&Port> {
        (**self).port(label)
    }
}

impl<T: Attachable + ?Sized> Attachable for Arc<T> {
    fn name(&self) -> &str {
        (**self).name()
    }

    fn system(&self) -> &MolecularSystem {
        (**self).system()
    }

    fn port(&self, label: PortLabel) -> Option<&Port> {
        (**self).port(label)
    }
}

/// A shared reference to either a loaded monomer or an already assembled block.
///
/// Sequences are lists of `MonomerRef`s; cloning one only bumps a reference count.
#[derive(Debug, Clone)]
pub enum MonomerRef {
    Leaf(Arc<MonomerTemplate>),
    Composite(Arc<PolymerBlock>),
}

impl Attachable for MonomerRef {
    fn name(&self) -> &str {
        match self {
            MonomerRef::Leaf(t) => t.name(),
            MonomerRef::Composite(b) => b.name(),
        }
    }

    fn system(&self) -> &MolecularSystem {
        match self {
            MonomerRef::Leaf(t) => t.system(),
            MonomerRef::Composite(b) => b.system(),
        }
    }

    fn port(&self, label: PortLabel) -> Option<&Port> {
        match self {
            MonomerRef::Leaf(t) => Attachable::port(t.as_ref(), label),
            MonomerRef::Composite(b) => Attachable::port(b.as_ref(), label),
        }
    }
}

/// Two references are equal when they point at the same shared unit.
impl PartialEq for MonomerRef {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (MonomerRef::Leaf(a), MonomerRef::Leaf(b)) => Arc::ptr_eq(a, b),
            (MonomerRef::Composite(a), MonomerRef::Composite(b)) => Arc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl From<MonomerTemplate> for MonomerRef {
    fn from(template: MonomerTemplate) -> Self {
        MonomerRef::Leaf(Arc::new(template))
    }
}

impl From<Arc<MonomerTemplate>> for MonomerRef {
    fn from(template: Arc<MonomerTemplate>) -> Self {
        MonomerRef::Leaf(template)
    }
}

impl From<PolymerBlock> for MonomerRef {
    fn from(block: PolymerBlock) -> Self {
        MonomerRef::Composite(Arc::new(block))
    }
}

impl From<Arc<PolymerBlock>> for MonomerRef {
    fn from(block: Arc<PolymerBlock>) -> Self {
        MonomerRef::Composite(block)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::atom::Atom;
    use crate::core::models::port::PortParams;
    use nalgebra::Point3;

    fn template(name: &str) -> MonomerTemplate {
        let mut system = MolecularSystem::new();
        let res = system.add_residue("UNL");
        for i in 0..2 {
            system
                .add_atom_to_residue(res, Atom::new("C", res, Point3::new(i as f64, 0.0, 0.0)))
                .unwrap();
        }
        let params = PortParams {
            bond_length: 0.1,
            orientation: Default::default(),
        };
        MonomerTemplate::new(name, system, (1, 0), &params).unwrap()
    }

    #[test]
    fn leaf_reference_exposes_both_ports() {
        let unit = MonomerRef::from(template("A"));
        assert_eq!(unit.name(), "A");
        assert_eq!(unit.port_count(), 2);
        assert!(matches!(unit, MonomerRef::Leaf(_)));
        assert_eq!(unit.system().atom_count(), 2);
    }

    #[test]
    fn empty_block_reference_has_no_ports() {
        let unit = MonomerRef::from(PolymerBlock::empty("E"));
        assert!(matches!(unit, MonomerRef::Composite(_)));
        assert_eq!(unit.port_count(), 0);
        assert!(unit.port(PortLabel::Up).is_none());
    }

    #[test]
    fn equality_is_by_shared_identity() {
        let shared = Arc::new(template("A"));
        let a = MonomerRef::from(shared.clone());
        let b = MonomerRef::from(shared);
        let c = MonomerRef::from(template("A"));
        assert_eq!(a, b);
        assert_ne!(a, c);
    }
}
