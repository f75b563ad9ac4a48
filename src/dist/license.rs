//! Full license text generation from the configured identifier.

use std::path::{Path, PathBuf};

use chrono::Datelike;

use crate::error::Result;

/// Generated license filename.
pub const LICENSE_FILE: &str = "LICENSE";

/// Full license text for the configured identifier and copyright holder.
///
/// Covers the identifiers the registry sees most; anything else gets a
/// plain all-rights-reserved notice naming the identifier so the file is
/// never empty.
pub fn text(license_id: &str, holder: &str) -> String {
    let year = chrono::Utc::now().year();
    match license_id {
        "MIT" => format!(
            "MIT License\n\n\
             Copyright (c) {year} {holder}\n\n\
             Permission is hereby granted, free of charge, to any person obtaining a copy\n\
             of this software and associated documentation files (the \"Software\"), to deal\n\
             in the Software without restriction, including without limitation the rights\n\
             to use, copy, modify, merge, publish, distribute, sublicense, and/or sell\n\
             copies of the Software, and to permit persons to whom the Software is\n\
             furnished to do so, subject to the following conditions:\n\n\
             The above copyright notice and this permission notice shall be included in all\n\
             copies or substantial portions of the Software.\n\n\
             THE SOFTWARE IS PROVIDED \"AS IS\", WITHOUT WARRANTY OF ANY KIND, EXPRESS OR\n\
             IMPLIED, INCLUDING BUT NOT LIMITED TO THE WARRANTIES OF MERCHANTABILITY,\n\
             FITNESS FOR A PARTICULAR PURPOSE AND NONINFRINGEMENT. IN NO EVENT SHALL THE\n\
             AUTHORS OR COPYRIGHT HOLDERS BE LIABLE FOR ANY CLAIM, DAMAGES OR OTHER\n\
             LIABILITY, WHETHER IN AN ACTION OF CONTRACT, TORT OR OTHERWISE, ARISING FROM,\n\
             OUT OF OR IN CONNECTION WITH THE SOFTWARE OR THE USE OR OTHER DEALINGS IN THE\n\
             SOFTWARE.\n"
        ),
        "Apache-2.0" => format!(
            "Copyright {year} {holder}\n\n\
             Licensed under the Apache License, Version 2.0 (the \"License\");\n\
             you may not use this file except in compliance with the License.\n\
             You may obtain a copy of the License at\n\n\
             \x20   http://www.apache.org/licenses/LICENSE-2.0\n\n\
             Unless required by applicable law or agreed to in writing, software\n\
             distributed under the License is distributed on an \"AS IS\" BASIS,\n\
             WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.\n\
             See the License for the specific language governing permissions and\n\
             limitations under the License.\n"
        ),
        other => {
            log::warn!("no full text known for license `{other}`; writing a notice");
            format!(
                "Copyright (c) {year} {holder}. All rights reserved.\n\n\
                 Distributed under the terms of the {other} license.\n"
            )
        }
    }
}

/// Write the license text into `dir`.
pub fn write(dir: &Path, license_id: &str, holder: &str) -> Result<PathBuf> {
    let path = dir.join(LICENSE_FILE);
    std::fs::write(&path, text(license_id, holder))?;
    Ok(path)
}
