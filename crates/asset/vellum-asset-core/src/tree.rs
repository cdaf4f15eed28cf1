//! Arena-backed element hierarchy.
//!
//! Elements live in an id-keyed map. Children are ordered id lists and the
//! parent is a plain id, so the parent edge never owns anything. In storage the
//! tree is written as nested documents rooted at the root element.

use serde::{Deserialize, Serialize};

use hashbrown::HashMap;

use crate::element::{AssetElement, ElementKind, ReferenceProperties, SpriteProperties};
use crate::error::AssetError;
use crate::ids::ElementId;

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ElementDoc", into = "ElementDoc")]
pub struct ElementTree {
    root: ElementId,
    elements: HashMap<ElementId, AssetElement>,
}

impl ElementTree {
    /// New tree holding only `root`. Any children or parent the element
    /// carries are discarded.
    pub fn new(mut root: AssetElement) -> Self {
        root.parent = None;
        root.children.clear();
        let id = root.id;
        let mut elements = HashMap::new();
        elements.insert(id, root);
        Self { root: id, elements }
    }

    #[inline]
    pub fn root_id(&self) -> ElementId {
        self.root
    }

    #[inline]
    pub fn root(&self) -> &AssetElement {
        &self.elements[&self.root]
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    #[inline]
    pub fn contains(&self, id: ElementId) -> bool {
        self.elements.contains_key(&id)
    }

    #[inline]
    pub fn get(&self, id: ElementId) -> Option<&AssetElement> {
        self.elements.get(&id)
    }

    #[inline]
    pub fn get_mut(&mut self, id: ElementId) -> Option<&mut AssetElement> {
        self.elements.get_mut(&id)
    }

    fn require(&self, id: ElementId) -> Result<&AssetElement, AssetError> {
        self.elements
            .get(&id)
            .ok_or(AssetError::UnknownElement { id })
    }

    pub fn parent(&self, id: ElementId) -> Option<ElementId> {
        self.elements.get(&id).and_then(|e| e.parent)
    }

    pub fn children(&self, id: ElementId) -> &[ElementId] {
        self.elements
            .get(&id)
            .map(|e| e.children.as_slice())
            .unwrap_or(&[])
    }

    /// Append `element` as the last child of `parent`.
    pub fn insert(
        &mut self,
        parent: ElementId,
        element: AssetElement,
    ) -> Result<ElementId, AssetError> {
        let index = self.children(parent).len();
        self.insert_at(parent, index, element)
    }

    /// Insert `element` under `parent` at `index` (clamped to the child count).
    pub fn insert_at(
        &mut self,
        parent: ElementId,
        index: usize,
        mut element: AssetElement,
    ) -> Result<ElementId, AssetError> {
        if self.elements.contains_key(&element.id) {
            return Err(AssetError::DuplicateElement { id: element.id });
        }
        let parent_el = self
            .elements
            .get_mut(&parent)
            .ok_or(AssetError::UnknownParent { id: parent })?;
        let id = element.id;
        let index = index.min(parent_el.children.len());
        parent_el.children.insert(index, id);
        element.parent = Some(parent);
        element.children.clear();
        self.elements.insert(id, element);
        Ok(id)
    }

    /// Remove `id` and its whole subtree, returning the removed elements in pre-order.
    pub fn remove(&mut self, id: ElementId) -> Result<Vec<AssetElement>, AssetError> {
        if id == self.root {
            return Err(AssetError::RootElement);
        }
        self.require(id)?;
        let doomed = self.descendants(id);
        if let Some(parent) = self.parent(id) {
            if let Some(p) = self.elements.get_mut(&parent) {
                p.children.retain(|c| *c != id);
            }
        }
        Ok(doomed
            .into_iter()
            .filter_map(|d| self.elements.remove(&d))
            .collect())
    }

    /// Move `id` under `new_parent` at `index`.
    pub fn reparent(
        &mut self,
        id: ElementId,
        new_parent: ElementId,
        index: usize,
    ) -> Result<(), AssetError> {
        if id == self.root {
            return Err(AssetError::RootElement);
        }
        self.require(id)?;
        if !self.contains(new_parent) {
            return Err(AssetError::UnknownParent { id: new_parent });
        }
        if new_parent == id || self.ancestors(new_parent).any(|a| a == id) {
            return Err(AssetError::CyclicHierarchy {
                id,
                parent: new_parent,
            });
        }
        if let Some(old_parent) = self.parent(id) {
            if let Some(p) = self.elements.get_mut(&old_parent) {
                p.children.retain(|c| *c != id);
            }
        }
        if let Some(p) = self.elements.get_mut(&new_parent) {
            let index = index.min(p.children.len());
            p.children.insert(index, id);
        }
        if let Some(e) = self.elements.get_mut(&id) {
            e.parent = Some(new_parent);
        }
        Ok(())
    }

    /// Give `id` a fresh id, relinking its parent and children. Returns the new id.
    pub fn renew_id(&mut self, id: ElementId) -> Result<ElementId, AssetError> {
        let mut element = self
            .elements
            .remove(&id)
            .ok_or(AssetError::UnknownElement { id })?;
        let new_id = element.renew_id();
        if let Some(parent) = element.parent {
            if let Some(p) = self.elements.get_mut(&parent) {
                for c in p.children.iter_mut().filter(|c| **c == id) {
                    *c = new_id;
                }
            }
        }
        for child in &element.children {
            if let Some(c) = self.elements.get_mut(child) {
                c.parent = Some(new_id);
            }
        }
        if self.root == id {
            self.root = new_id;
        }
        self.elements.insert(new_id, element);
        Ok(new_id)
    }

    /// Ancestors of `id`, nearest first.
    pub fn ancestors(&self, id: ElementId) -> impl Iterator<Item = ElementId> + '_ {
        std::iter::successors(self.parent(id), move |p| self.parent(*p))
    }

    /// `id` followed by every element below it, pre-order.
    pub fn descendants(&self, id: ElementId) -> Vec<ElementId> {
        let mut out = Vec::new();
        if !self.contains(id) {
            return out;
        }
        let mut stack = vec![id];
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend(self.children(next).iter().rev().copied());
        }
        out
    }

    /// Every element id, pre-order from the root.
    pub fn iter(&self) -> impl Iterator<Item = &AssetElement> + '_ {
        self.descendants(self.root)
            .into_iter()
            .filter_map(move |id| self.elements.get(&id))
    }

    /// Sum of authored offsets from the root down to `id`.
    pub fn absolute_offset(&self, id: ElementId) -> Option<[f32; 3]> {
        let mut acc = self.get(id)?.world_offset;
        for a in self.ancestors(id) {
            if let Some(e) = self.get(a) {
                for (acc_i, off_i) in acc.iter_mut().zip(e.world_offset) {
                    *acc_i += off_i;
                }
            }
        }
        Some(acc)
    }

    /// Effective flip of `id`: each flipped element on the path toggles it.
    pub fn is_flipped(&self, id: ElementId) -> bool {
        let own = self.get(id).map(|e| e.horizontally_flipped).unwrap_or(false);
        self.ancestors(id)
            .filter_map(|a| self.get(a))
            .fold(own, |acc, e| acc ^ e.horizontally_flipped)
    }

    /// Deep copy of the subtree at `id` with fresh ids, detached from any parent.
    /// Returns the copies in pre-order plus the old-to-new id mapping.
    pub(crate) fn clone_subtree(
        &self,
        id: ElementId,
    ) -> Result<(Vec<AssetElement>, HashMap<ElementId, ElementId>), AssetError> {
        self.require(id)?;
        let order = self.descendants(id);
        let mapping: HashMap<ElementId, ElementId> =
            order.iter().map(|old| (*old, ElementId::new())).collect();
        let copies = order
            .iter()
            .filter_map(|old| self.get(*old))
            .map(|e| {
                let mut copy = e.clone();
                copy.id = mapping[&e.id];
                copy.parent = if e.id == id {
                    None
                } else {
                    e.parent.and_then(|p| mapping.get(&p).copied())
                };
                copy.children = e.children.iter().map(|c| mapping[c]).collect();
                copy
            })
            .collect();
        Ok((copies, mapping))
    }

    fn to_doc(&self, e: &AssetElement) -> ElementDoc {
        let kind = match &e.kind {
            ElementKind::Transform => KindDoc::Transform,
            ElementKind::Sprite(s) => KindDoc::Sprite(s.clone()),
            ElementKind::Reference(r) => KindDoc::Reference(r.clone()),
        };
        ElementDoc {
            id: e.id,
            name: e.name.clone(),
            kind,
            visible: e.visible,
            world_offset: e.world_offset,
            horizontally_flipped: e.horizontally_flipped,
            children: e
                .children
                .iter()
                .filter_map(|c| self.get(*c))
                .map(|c| self.to_doc(c))
                .collect(),
        }
    }

    fn attach_doc(&mut self, parent: ElementId, doc: ElementDoc) -> Result<(), AssetError> {
        let (element, children) = doc.split();
        let id = self.insert(parent, element)?;
        for child in children {
            self.attach_doc(id, child)?;
        }
        Ok(())
    }
}

// ----- storage schema (serde) -----

fn default_visible() -> bool {
    true
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ElementDoc {
    id: ElementId,
    #[serde(default)]
    name: String,
    #[serde(flatten)]
    kind: KindDoc,
    #[serde(default = "default_visible")]
    visible: bool,
    #[serde(default)]
    world_offset: [f32; 3],
    #[serde(default)]
    horizontally_flipped: bool,
    #[serde(default)]
    children: Vec<ElementDoc>,
}

#[derive(Clone, Debug, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
enum KindDoc {
    Transform,
    Sprite(SpriteProperties),
    Reference(ReferenceProperties),
}

impl ElementDoc {
    fn split(self) -> (AssetElement, Vec<ElementDoc>) {
        let kind = match self.kind {
            KindDoc::Transform => ElementKind::Transform,
            KindDoc::Sprite(s) => ElementKind::Sprite(s),
            KindDoc::Reference(r) => ElementKind::Reference(r),
        };
        let element = AssetElement {
            id: self.id,
            name: self.name,
            parent: None,
            children: Vec::new(),
            visible: self.visible,
            world_offset: self.world_offset,
            horizontally_flipped: self.horizontally_flipped,
            kind,
        };
        (element, self.children)
    }
}

impl TryFrom<ElementDoc> for ElementTree {
    type Error = AssetError;

    fn try_from(doc: ElementDoc) -> Result<Self, Self::Error> {
        let (root, children) = doc.split();
        let mut tree = ElementTree::new(root);
        let root_id = tree.root;
        for child in children {
            tree.attach_doc(root_id, child)?;
        }
        Ok(tree)
    }
}

impl From<ElementTree> for ElementDoc {
    fn from(tree: ElementTree) -> Self {
        tree.to_doc(tree.root())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (ElementTree, ElementId, ElementId, ElementId) {
        let mut tree = ElementTree::new(AssetElement::transform("root").with_offset([1.0, 0.0, 0.0]));
        let root = tree.root_id();
        let body = tree
            .insert(root, AssetElement::transform("body").with_offset([0.0, 2.0, 0.0]))
            .unwrap();
        let arm = tree
            .insert(
                body,
                AssetElement::sprite("arm", SpriteProperties::default()).with_offset([0.0, 0.0, 3.0]),
            )
            .unwrap();
        (tree, root, body, arm)
    }

    #[test]
    fn insert_rejects_unknown_parent_and_duplicate_ids() {
        let (mut tree, root, body, _) = sample_tree();
        let stray = ElementId::new();
        assert_eq!(
            tree.insert(stray, AssetElement::transform("x")).unwrap_err(),
            AssetError::UnknownParent { id: stray }
        );
        assert_eq!(
            tree.insert(root, AssetElement::transform("dup").with_id(body))
                .unwrap_err(),
            AssetError::DuplicateElement { id: body }
        );
    }

    #[test]
    fn offsets_accumulate_and_flips_toggle() {
        let (mut tree, root, body, arm) = sample_tree();
        assert_eq!(tree.absolute_offset(arm), Some([1.0, 2.0, 3.0]));
        tree.get_mut(root).unwrap().horizontally_flipped = true;
        assert!(tree.is_flipped(arm));
        tree.get_mut(body).unwrap().horizontally_flipped = true;
        assert!(!tree.is_flipped(arm));
    }

    #[test]
    fn remove_takes_subtree_and_protects_root() {
        let (mut tree, root, body, arm) = sample_tree();
        assert_eq!(tree.remove(root).unwrap_err(), AssetError::RootElement);
        let removed = tree.remove(body).unwrap();
        assert_eq!(removed.len(), 2);
        assert!(!tree.contains(arm));
        assert!(tree.children(root).is_empty());
    }

    #[test]
    fn reparent_rejects_cycles() {
        let (mut tree, root, body, arm) = sample_tree();
        assert!(matches!(
            tree.reparent(body, arm, 0),
            Err(AssetError::CyclicHierarchy { .. })
        ));
        tree.reparent(arm, root, 0).unwrap();
        assert_eq!(tree.children(root), &[arm, body]);
        assert_eq!(tree.parent(arm), Some(root));
        assert!(tree.children(body).is_empty());
    }

    #[test]
    fn renew_id_relinks_neighbours() {
        let (mut tree, root, body, arm) = sample_tree();
        let fresh = tree.renew_id(body).unwrap();
        assert_ne!(fresh, body);
        assert!(!tree.contains(body));
        assert_eq!(tree.children(root), &[fresh]);
        assert_eq!(tree.parent(arm), Some(fresh));
        assert_eq!(tree.get(fresh).unwrap().id(), fresh);
    }

    #[test]
    fn pre_order_iteration() {
        let (tree, root, body, arm) = sample_tree();
        let order: Vec<ElementId> = tree.iter().map(|e| e.id()).collect();
        assert_eq!(order, vec![root, body, arm]);
    }
}
