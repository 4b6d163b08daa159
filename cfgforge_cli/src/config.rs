//---------------------------------------------------------------------------//
// Copyright (c) 2019-2026 CfgForge Developers. All rights reserved.
//
// This file is part of the CfgForge project,
// which can be found here: https://github.com/cfgforge/cfgforge.
//
// This file is licensed under the MIT license, which can be found here:
// https://github.com/cfgforge/cfgforge/blob/master/LICENSE.
//---------------------------------------------------------------------------//

//! This module contains the runtime config of the CLI tool.

/// Runtime config of the tool, built from the global flags.
pub struct Config {

    /// How chatty the tool should be. 0 is warnings only.
    pub verbosity_level: u8,
}
