//-
// Copyright (c) 2026, the mboxscan authors
//
// This file is part of mboxscan.
//
// Mboxscan is free software: you can redistribute it and/or modify it under
// the terms of  the GNU General Public  License as published by  the Free
// Software Foundation, either version 3 of the License, or (at your option)
// any later version.
//
// Mboxscan is distributed in the hope that  it will be useful,  but WITHOUT
// ANY  WARRANTY; without  even the implied  warranty of MERCHANTABILITY  or
// FITNESS FOR A PARTICULAR PURPOSE. See the GNU General Public License for
// more details.
//
// You should have received a copy of the GNU General Public License along
// with mboxscan. If not, see <http://www.gnu.org/licenses/>.

pub mod error;
pub mod line_stream;
