//! Consumers of an [`archmap_core::ArchitectureIndex`]: terminal text,
//! Markdown, JSON, Mermaid and GraphViz renderings.

pub mod diagram;
pub mod dot;
pub mod json;
pub mod markdown;
pub mod text;

#[cfg(test)]
pub(crate) mod testing {
    use archmap_core::{ArchitectureIndex, IndexBuilder};

    /// Four modules: an entry point, a component, a service and a model,
    /// with the service and model importing each other.
    pub const SAMPLE: &str = concat!(
        "filepath:///src/index.ts /// /// ///\n",
        "file code{\n",
        "import { Header } from './components/Header';\n",
        "Header();\n",
        "}\n\n",
        "filepath:///src/components/Header.tsx /// /// ///\n",
        "file code{\n",
        "import { fetchUser } from '../services/api';\n",
        "export function Header() {\n",
        "  return fetchUser();\n",
        "}\n",
        "}\n\n",
        "filepath:///src/services/api.ts /// /// ///\n",
        "file code{\n",
        "import { User } from '../models/user';\n",
        "import axios from 'axios';\n",
        "export async function fetchUser() {\n",
        "  return axios.get('/user');\n",
        "}\n",
        "}\n\n",
        "filepath:///src/models/user.ts /// /// ///\n",
        "file code{\n",
        "import { fetchUser } from '../services/api';\n",
        "export class User {}\n",
        "}\n",
    );

    pub const ACYCLIC: &str = concat!(
        "filepath:///a.ts /// /// ///\n",
        "file code{\n",
        "import './b'\n",
        "}\n\n",
        "filepath:///b.ts /// /// ///\n",
        "file code{\n",
        "export const b = 1;\n",
        "}\n",
    );

    pub fn sample_index() -> ArchitectureIndex {
        IndexBuilder::default().build_from_container(SAMPLE)
    }

    pub fn acyclic_index() -> ArchitectureIndex {
        IndexBuilder::default().build_from_container(ACYCLIC)
    }
}
