//! Index queries.
//!
//! Every query reflects the writer's current state, uncommitted writes
//! included, and lists only present entities. Results come back in index
//! order, which is stable for a given state.

use super::Store;
use crate::error::CoreResult;
use crate::id::Id;
use crate::types::Label;

impl Store {
    /// Ids of nodes labelled `label`.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn nodes_by_label(&self, label: Label) -> CoreResult<Vec<Id>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        Ok(self.graph.nodes.index().by_label(label).collect())
    }

    /// Outgoing edges of `src` as `(edge, label, dst)`.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn edges_by_src(&self, src: Id) -> CoreResult<Vec<(Id, Label, Id)>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        Ok(self.graph.edges.index().from_src(src).collect())
    }

    /// Outgoing `label` edges of `src` as `(edge, dst)`.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn edges_by_src_label(&self, src: Id, label: Label) -> CoreResult<Vec<(Id, Id)>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        Ok(self.graph.edges.index().from_src_label(src, label).collect())
    }

    /// Incoming edges of `dst` as `(edge, src, label)`.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn edges_by_dst(&self, dst: Id) -> CoreResult<Vec<(Id, Id, Label)>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        Ok(self.graph.edges.index().into_dst(dst).collect())
    }

    /// Incoming `label` edges of `dst` as `(edge, src)`.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn edges_by_dst_label(&self, dst: Id, label: Label) -> CoreResult<Vec<(Id, Id)>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        Ok(self.graph.edges.index().into_dst_label(dst, label).collect())
    }

    /// Atoms attached to `src` as `(atom, label, value)`.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn atoms_by_src(&self, src: Id) -> CoreResult<Vec<(Id, Label, Vec<u8>)>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        let atoms = &self.graph.atoms;
        Ok(atoms
            .index()
            .from_src(src)
            .filter_map(|(id, label)| atoms.get(id).map(|atom| (id, label, atom.value.clone())))
            .collect())
    }

    /// `label` atoms attached to `src` as `(atom, value)`.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn atoms_by_src_label(&self, src: Id, label: Label) -> CoreResult<Vec<(Id, Vec<u8>)>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        let atoms = &self.graph.atoms;
        Ok(atoms
            .index()
            .from_src_label(src, label)
            .filter_map(|id| atoms.get(id).map(|atom| (id, atom.value.clone())))
            .collect())
    }

    /// Atoms labelled `label` as `(atom, src, value)`, in value order.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn atoms_by_label(&self, label: Label) -> CoreResult<Vec<(Id, Id, Vec<u8>)>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        Ok(self
            .graph
            .atoms
            .index()
            .by_label_prefix(label, &[])
            .map(|(id, src, value)| (id, src, value.to_vec()))
            .collect())
    }

    /// Atoms labelled `label` whose value starts with `prefix`, as
    /// `(atom, src)` in value order.
    ///
    /// An empty prefix matches every atom with the label.
    ///
    /// # Errors
    ///
    /// Fails if the store is closed.
    pub fn atoms_by_label_value(&self, label: Label, prefix: &[u8]) -> CoreResult<Vec<(Id, Id)>> {
        self.ensure_open()?;
        self.stats.record_index_query();
        Ok(self
            .graph
            .atoms
            .index()
            .by_label_prefix(label, prefix)
            .map(|(id, src, _)| (id, src))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use crate::{Id, Label, Store};

    const PERSON: Label = Label(1);
    const KNOWS: Label = Label(2);
    const LIKES: Label = Label(3);
    const NAME: Label = Label(4);
    const TAG: Label = Label(5);

    #[test]
    fn edge_queries_follow_updates() {
        let mut store = Store::open_in_memory().unwrap();
        let (a, b, c) = (Id::mint(), Id::mint(), Id::mint());
        let (ab, ac) = (Id::mint(), Id::mint());
        store.set_edge(ab, a, KNOWS, b).unwrap();
        store.set_edge(ac, a, LIKES, c).unwrap();

        assert_eq!(store.edges_by_src(a).unwrap().len(), 2);
        assert_eq!(store.edges_by_src_label(a, KNOWS).unwrap(), vec![(ab, b)]);
        assert_eq!(store.edges_by_dst(c).unwrap(), vec![(ac, a, LIKES)]);
        assert_eq!(store.edges_by_dst_label(b, KNOWS).unwrap(), vec![(ab, a)]);

        store.set_edge(ab, a, KNOWS, c).unwrap();
        assert!(store.edges_by_dst(b).unwrap().is_empty());
        assert_eq!(store.edges_by_dst_label(c, KNOWS).unwrap(), vec![(ab, a)]);

        store.remove_edge(ac).unwrap();
        assert_eq!(store.edges_by_src(a).unwrap(), vec![(ab, KNOWS, c)]);
    }

    #[test]
    fn atom_queries() {
        let mut store = Store::open_in_memory().unwrap();
        let (ada, bob) = (Id::mint(), Id::mint());
        let (n1, n2, t1) = (Id::mint(), Id::mint(), Id::mint());
        store.set_atom(n1, ada, NAME, b"ada".to_vec()).unwrap();
        store.set_atom(n2, bob, NAME, b"adam".to_vec()).unwrap();
        store.set_atom(t1, ada, TAG, b"admin".to_vec()).unwrap();

        assert_eq!(
            store.atoms_by_label_value(NAME, b"ada").unwrap(),
            vec![(n1, ada), (n2, bob)]
        );
        assert_eq!(
            store.atoms_by_label_value(NAME, b"adam").unwrap(),
            vec![(n2, bob)]
        );
        assert_eq!(store.atoms_by_label(NAME).unwrap().len(), 2);
        assert_eq!(
            store.atoms_by_src_label(ada, TAG).unwrap(),
            vec![(t1, b"admin".to_vec())]
        );
        assert_eq!(store.atoms_by_src(ada).unwrap().len(), 2);

        store.set_atom(n2, bob, NAME, b"bob".to_vec()).unwrap();
        assert_eq!(
            store.atoms_by_label_value(NAME, b"ada").unwrap(),
            vec![(n1, ada)]
        );
        assert_eq!(store.stats().index_queries, 6);
    }

    #[test]
    fn node_queries_drop_removed() {
        let mut store = Store::open_in_memory().unwrap();
        let (a, b) = (Id::mint(), Id::mint());
        store.set_node(a, PERSON).unwrap();
        store.set_node(b, PERSON).unwrap();
        store.remove_node(a).unwrap();
        assert_eq!(store.nodes_by_label(PERSON).unwrap(), vec![b]);
    }
}
