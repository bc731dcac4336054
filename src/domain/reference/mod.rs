// Copyright 2025 JiangLong.
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! User reference strings and sinks

pub mod parser;
pub mod prefix;
pub mod sink;

pub use parser::{parse_ref, ParsedRef, ResourceRef};
pub use prefix::{kind_to_resource, Gvr, PrefixTable};
pub use sink::{
    parse_sink, parse_with_default, ref_as_text, resolve_optional, resolve_sink, sink_to_text,
    SinkTarget,
};
