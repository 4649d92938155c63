// This file is part of the terraform-provider-fortimanager project
//
// Copyright (C) ANEO, 2024-2024. All rights reserved.
//
// Licensed under the Apache License, Version 2.0 (the "License")
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

//! Conversion between Terraform attribute paths and the nested objects of the remote API.
//!
//! `expand` builds request bodies from the state, `flatten` turns responses back into state.

mod expand;
mod flatten;
mod path;
mod state;
mod wire;

pub use expand::expand;
pub use flatten::flatten;
pub use path::{wire_key, StatePath};
pub use state::{Planned, StateBlock, StateValue};
pub use wire::{WireMap, WireValue};
