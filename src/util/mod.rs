/*!
Supporting types and routines shared by the compiler, the VM and the public
API.

Most of this is crate internal. The public pieces are the search
configuration ([`search::Input`]) and the capture group metadata
([`captures::GroupInfo`]), both of which are also re-exported at the crate
root.
*/

pub mod captures;
pub mod search;

pub(crate) mod iter;
pub(crate) mod look;
pub(crate) mod pool;
pub(crate) mod prefilter;
pub(crate) mod utf8;
