use alloc::{sync::Arc, vec::Vec};

/// Represents information about the capturing groups in a compiled pattern.
///
/// The information encapsulated by this type consists of:
///
/// * A map from every capture group index to its name, if it has one.
/// * A map from every capture group name to all of the indices that use
/// that name. A name maps to more than one index only when a pattern was
/// compiled with duplicate names allowed.
/// * The number of slots needed to record a match. A slot refers to one half
/// of a capturing group: either its start or its end.
///
/// Group `0` is always present, always unnamed and always refers to the
/// overall match. The explicit groups in a pattern are numbered from `1` in
/// the order of their opening parenthesis.
///
/// This type is cheap to clone. Every [`Match`](crate::Match) holds one.
#[derive(Clone, Debug)]
pub struct GroupInfo(Arc<GroupInfoInner>);

#[derive(Debug)]
struct GroupInfoInner {
    /// Indexed by group index. Always has at least one entry (group 0).
    index_to_name: Vec<Option<Arc<str>>>,
    /// Names in the order of their first definition, along with every group
    /// index that uses the name in increasing order.
    name_to_index: Vec<(Arc<str>, Vec<usize>)>,
}

impl GroupInfo {
    /// Build group info from the names of the explicit groups, in order of
    /// their opening parenthesis. (Group 0 is implicit.)
    pub(crate) fn new<I, N>(explicit: I) -> GroupInfo
    where
        I: IntoIterator<Item = Option<N>>,
        N: AsRef<str>,
    {
        let mut inner = GroupInfoInner {
            index_to_name: vec![None],
            name_to_index: vec![],
        };
        for maybe_name in explicit {
            let index = inner.index_to_name.len();
            let name = match maybe_name {
                None => {
                    inner.index_to_name.push(None);
                    continue;
                }
                Some(name) => name,
            };
            let name = name.as_ref();
            match inner.name_to_index.iter_mut().find(|(n, _)| &**n == name) {
                Some((existing, indices)) => {
                    indices.push(index);
                    let shared = Arc::clone(existing);
                    inner.index_to_name.push(Some(shared));
                }
                None => {
                    let name: Arc<str> = Arc::from(name);
                    inner.index_to_name.push(Some(Arc::clone(&name)));
                    inner.name_to_index.push((name, vec![index]));
                }
            }
        }
        GroupInfo(Arc::new(inner))
    }

    /// Return the first capture group index corresponding to the given name.
    /// If no such capture group name exists, then this returns `None`.
    ///
    /// # Example
    ///
    /// ```
    /// use regex_backtrack::Regex;
    ///
    /// let re = Regex::new(r"a(?P<quux>\w+)z(?P<foo>\s+)")?;
    /// let info = re.group_info();
    /// assert_eq!(Some(2), info.to_index("foo"));
    /// assert_eq!(None, info.to_index("bar"));
    ///
    /// # Ok::<(), Box<dyn std::error::Error>>(())
    /// ```
    #[inline]
    pub fn to_index(&self, name: &str) -> Option<usize> {
        self.to_indices(name).first().copied()
    }

    /// Return every capture group index using the given name, in increasing
    /// order. This is empty if the name is not used.
    #[inline]
    pub fn to_indices(&self, name: &str) -> &[usize] {
        self.0
            .name_to_index
            .iter()
            .find(|(n, _)| &**n == name)
            .map_or(&[][..], |(_, indices)| indices.as_slice())
    }

    /// Return the capture name for the given index. If the corresponding
    /// group does not have a name, or if the index is out of range, then
    /// this returns `None`.
    #[inline]
    pub fn to_name(&self, index: usize) -> Option<&str> {
        self.0.index_to_name.get(index)?.as_deref()
    }

    /// Returns an iterator over every group index along with its optional
    /// name, starting with the implicit group `0`.
    #[inline]
    pub fn all_names(&self) -> impl Iterator<Item = (usize, Option<&str>)> {
        self.0
            .index_to_name
            .iter()
            .enumerate()
            .map(|(index, name)| (index, name.as_deref()))
    }

    /// Returns an iterator over every distinct group name along with the
    /// first group index that uses it, in the order the names were first
    /// defined.
    #[inline]
    pub fn names(&self) -> impl Iterator<Item = (&str, usize)> {
        self.0
            .name_to_index
            .iter()
            .map(|(name, indices)| (&**name, indices[0]))
    }

    /// Returns the number of explicit groups. This does not count the
    /// implicit group `0`.
    #[inline]
    pub fn explicit_group_len(&self) -> usize {
        self.0.index_to_name.len() - 1
    }

    /// Returns the total number of groups, including the implicit group `0`.
    #[inline]
    pub fn group_len(&self) -> usize {
        self.0.index_to_name.len()
    }

    /// Returns the total number of slots: two per group.
    #[inline]
    pub fn slot_len(&self) -> usize {
        self.group_len() * 2
    }

    /// Returns the start and end slots of the given group.
    #[inline]
    pub(crate) fn slots(&self, index: usize) -> (usize, usize) {
        (index * 2, index * 2 + 1)
    }
}
