//! Character trie stored as a flat arena of nodes.
//!
//! Keys are normalized phrases whose tokens are joined by a single space, so a
//! multi-token phrase is found by walking the tokens one after another with a
//! space edge in between. Only nodes reached at the end of a whole token can
//! produce a match.

use crate::error::{Error, Result};
use crate::format::ByteReader;

pub type NodeId = u32;

pub const ROOT: NodeId = 0;

const TOKEN_SEPARATOR: char = ' ';

// flag + value + child count
const MIN_NODE_SIZE: usize = 9;
const CHILD_SIZE: usize = 8;

#[derive(Debug, Clone, Default, PartialEq)]
struct Node {
    /// Sorted by char.
    children: Vec<(char, NodeId)>,
    value: Option<u32>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Trie {
    nodes: Vec<Node>,
    len: usize,
}

impl Default for Trie {
    fn default() -> Self {
        Self::new()
    }
}

impl Trie {
    pub fn new() -> Self {
        Self { nodes: vec![Node::default()], len: 0 }
    }

    /// Number of keys.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn num_nodes(&self) -> usize {
        self.nodes.len()
    }

    fn child(&self, node: NodeId, c: char) -> Option<NodeId> {
        let children = &self.nodes[node as usize].children;
        children
            .binary_search_by_key(&c, |&(k, _)| k)
            .ok()
            .map(|i| children[i].1)
    }

    fn child_or_insert(&mut self, node: NodeId, c: char) -> NodeId {
        let next = self.nodes.len() as NodeId;
        let children = &mut self.nodes[node as usize].children;
        match children.binary_search_by_key(&c, |&(k, _)| k) {
            Ok(i) => children[i].1,
            Err(i) => {
                children.insert(i, (c, next));
                self.nodes.push(Node::default());
                next
            }
        }
    }

    /// Inserts `key`, returning the value it replaced.
    pub fn insert(&mut self, key: &str, value: u32) -> Option<u32> {
        let mut node = ROOT;
        for c in key.chars() {
            node = self.child_or_insert(node, c);
        }
        let prev = self.nodes[node as usize].value.replace(value);
        if prev.is_none() {
            self.len += 1;
        }
        prev
    }

    /// Follows `s` from `node`, returning the node reached if every edge exists.
    pub fn walk(&self, node: NodeId, s: &str) -> Option<NodeId> {
        s.chars().try_fold(node, |n, c| self.child(n, c))
    }

    pub fn get(&self, key: &str) -> Option<u32> {
        self.walk(ROOT, key)
            .and_then(|n| self.nodes[n as usize].value)
    }

    /// Longest key equal to `tokens[start..end]` joined by spaces.
    ///
    /// Returns the exclusive end index and the stored value.
    pub fn search_longest_prefix<S: AsRef<str>>(
        &self,
        tokens: &[S],
        start: usize,
    ) -> Option<(usize, u32)> {
        self.search_longest_prefix_from(ROOT, tokens, start)
    }

    /// Same as [`Trie::search_longest_prefix`] but starting below `node`,
    /// typically the node reached by walking a scope prefix.
    pub fn search_longest_prefix_from<S: AsRef<str>>(
        &self,
        node: NodeId,
        tokens: &[S],
        start: usize,
    ) -> Option<(usize, u32)> {
        let mut node = node;
        let mut best = None;
        for (i, token) in tokens.iter().enumerate().skip(start) {
            let token = token.as_ref();
            if token.is_empty() {
                break;
            }
            if i > start {
                match self.child(node, TOKEN_SEPARATOR) {
                    Some(n) => node = n,
                    None => break,
                }
            }
            match self.walk(node, token) {
                Some(n) => node = n,
                None => break,
            }
            if let Some(value) = self.nodes[node as usize].value {
                best = Some((i + 1, value));
            }
        }
        best
    }

    /// All `(key, value)` pairs in lexicographic order of chars.
    pub fn iter(&self) -> Iter<'_> {
        Iter { trie: self, stack: vec![(ROOT, String::new())] }
    }

    pub fn save(&self) -> Vec<u8> {
        let n_children: usize = self.nodes.iter().map(|n| n.children.len()).sum();
        let mut out =
            Vec::with_capacity(4 + self.nodes.len() * MIN_NODE_SIZE + n_children * CHILD_SIZE);
        out.extend_from_slice(&(self.nodes.len() as u32).to_le_bytes());
        for node in &self.nodes {
            match node.value {
                Some(v) => {
                    out.push(1);
                    out.extend_from_slice(&v.to_le_bytes());
                }
                None => {
                    out.push(0);
                    out.extend_from_slice(&0u32.to_le_bytes());
                }
            }
            out.extend_from_slice(&(node.children.len() as u32).to_le_bytes());
            for &(c, id) in &node.children {
                out.extend_from_slice(&(c as u32).to_le_bytes());
                out.extend_from_slice(&id.to_le_bytes());
            }
        }
        out
    }

    pub fn load(buf: &[u8]) -> Result<Self> {
        let mut rdr = ByteReader::new(buf, "trie");
        let n = rdr.read_u32()? as usize;
        if n == 0 {
            return Err(Error::invalid_model("trie has no root node"));
        }
        if n > rdr.remaining() / MIN_NODE_SIZE {
            return Err(Error::invalid_model("truncated trie"));
        }

        let mut nodes = Vec::with_capacity(n);
        let mut has_parent = vec![false; n];
        let mut len = 0;
        for _ in 0..n {
            let flag = rdr.read_u8()?;
            let v = rdr.read_u32()?;
            let value = match flag {
                0 => None,
                1 => {
                    len += 1;
                    Some(v)
                }
                _ => return Err(Error::invalid_model(format!("bad trie value flag {flag}"))),
            };
            let n_children = rdr.read_u32()? as usize;
            if n_children > rdr.remaining() / CHILD_SIZE {
                return Err(Error::invalid_model("truncated trie"));
            }
            let mut children: Vec<(char, NodeId)> = Vec::with_capacity(n_children);
            for _ in 0..n_children {
                let c = rdr.read_u32()?;
                let c = char::from_u32(c)
                    .ok_or_else(|| Error::invalid_model(format!("bad trie edge {c:#x}")))?;
                let id = rdr.read_u32()?;
                if id == ROOT || id as usize >= n || has_parent[id as usize] {
                    return Err(Error::invalid_model(format!("bad trie child id {id}")));
                }
                has_parent[id as usize] = true;
                if let Some(&(prev, _)) = children.last() {
                    if prev >= c {
                        return Err(Error::invalid_model("unsorted trie edges"));
                    }
                }
                children.push((c, id));
            }
            nodes.push(Node { children, value });
        }
        rdr.finish()?;
        Ok(Self { nodes, len })
    }
}

pub struct Iter<'a> {
    trie: &'a Trie,
    stack: Vec<(NodeId, String)>,
}

impl Iterator for Iter<'_> {
    type Item = (String, u32);

    fn next(&mut self) -> Option<Self::Item> {
        while let Some((node, key)) = self.stack.pop() {
            let node = &self.trie.nodes[node as usize];
            for &(c, child) in node.children.iter().rev() {
                let mut k = key.clone();
                k.push(c);
                self.stack.push((child, k));
            }
            if let Some(value) = node.value {
                return Some((key, value));
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Trie {
        let mut trie = Trie::new();
        trie.insert("saint", 1);
        trie.insert("saint john", 2);
        trie.insert("saint john river road", 3);
        trie.insert("st", 4);
        trie
    }

    #[test]
    fn insert_and_get() {
        let mut trie = sample();
        assert_eq!(trie.len(), 4);
        assert_eq!(trie.get("saint john"), Some(2));
        assert_eq!(trie.get("saint jo"), None);
        assert_eq!(trie.get("street"), None);
        assert_eq!(trie.insert("st", 5), Some(4));
        assert_eq!(trie.len(), 4);
        assert_eq!(trie.get("st"), Some(5));
    }

    #[test]
    fn longest_match_wins() {
        let trie = sample();
        let tokens = ["saint", "john", "river", "road", "north"];
        assert_eq!(trie.search_longest_prefix(&tokens, 0), Some((4, 3)));

        let tokens = ["saint", "john", "river", "street"];
        assert_eq!(trie.search_longest_prefix(&tokens, 0), Some((2, 2)));

        let tokens = ["main", "saint", "johnson"];
        assert_eq!(trie.search_longest_prefix(&tokens, 1), Some((2, 1)));
        assert_eq!(trie.search_longest_prefix(&tokens, 0), None);
    }

    #[test]
    fn match_ends_on_token_boundary() {
        let trie = sample();
        assert_eq!(trie.search_longest_prefix(&["street"], 0), None);
        assert_eq!(trie.search_longest_prefix(&["st"], 0), Some((1, 4)));
        assert_eq!(trie.search_longest_prefix(&["saint", ""], 0), Some((1, 1)));
        assert_eq!(trie.search_longest_prefix(&["", "saint"], 0), None);
        assert_eq!(trie.search_longest_prefix::<&str>(&[], 0), None);
    }

    #[test]
    fn search_below_scope_node() {
        let mut trie = Trie::new();
        trie.insert("en||st", 7);
        trie.insert("fr||st", 8);
        let en = trie.walk(ROOT, "en||").unwrap();
        let fr = trie.walk(ROOT, "fr||").unwrap();
        assert_eq!(trie.search_longest_prefix_from(en, &["st"], 0), Some((1, 7)));
        assert_eq!(trie.search_longest_prefix_from(fr, &["st"], 0), Some((1, 8)));
        assert!(trie.walk(ROOT, "de||").is_none());
    }

    #[test]
    fn save_load_preserves_lookups() {
        let trie = sample();
        let loaded = Trie::load(&trie.save()).unwrap();
        assert_eq!(loaded, trie);
        let tokens = ["saint", "john", "river", "road"];
        for start in 0..tokens.len() {
            assert_eq!(
                loaded.search_longest_prefix(&tokens, start),
                trie.search_longest_prefix(&tokens, start)
            );
        }
        assert_eq!(Trie::load(&Trie::new().save()).unwrap().len(), 0);
    }

    #[test]
    fn load_rejects_corruption() {
        let buf = sample().save();
        assert!(Trie::load(&buf[..buf.len() - 3]).is_err());
        assert!(Trie::load(&[]).is_err());
        assert!(Trie::load(&0u32.to_le_bytes()).is_err());

        // root: no value, one child pointing back at the root
        let mut cyclic = Vec::new();
        cyclic.extend_from_slice(&1u32.to_le_bytes());
        cyclic.push(0);
        cyclic.extend_from_slice(&0u32.to_le_bytes());
        cyclic.extend_from_slice(&1u32.to_le_bytes());
        cyclic.extend_from_slice(&('a' as u32).to_le_bytes());
        cyclic.extend_from_slice(&ROOT.to_le_bytes());
        assert!(Trie::load(&cyclic).is_err());
    }

    #[test]
    fn iter_in_key_order() {
        let keys: Vec<(String, u32)> = sample().iter().collect();
        assert_eq!(
            keys,
            vec![
                ("saint".to_string(), 1),
                ("saint john".to_string(), 2),
                ("saint john river road".to_string(), 3),
                ("st".to_string(), 4),
            ]
        );
    }
}
