//! Projects, groups and their persisted shape
//!
//! A [`Project`] owns every filter in one flat map and keeps groups as
//! ordered lists of filter ids. A [`Workspace`] holds all projects and
//! remembers which one is selected; only the selected project is evaluated.

use crate::config::EngineConfig;
use crate::filter::{ColorAllocator, Filter, FilterColor, FilterError, FilterFlags, FilterId};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

fn enabled() -> bool {
    true
}

/// Persisted filter: `{pattern, color, highlighted, shown, exclude}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FilterDef {
    pub pattern: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub color: Option<FilterColor>,
    #[serde(default = "enabled")]
    pub highlighted: bool,
    #[serde(default = "enabled")]
    pub shown: bool,
    #[serde(default)]
    pub exclude: bool,
}

impl FilterDef {
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            color: None,
            highlighted: true,
            shown: true,
            exclude: false,
        }
    }

    pub fn excluding(mut self) -> Self {
        self.exclude = true;
        self
    }

    pub fn hidden(mut self) -> Self {
        self.shown = false;
        self
    }

    fn flags(&self) -> FilterFlags {
        FilterFlags {
            highlighted: self.highlighted,
            shown: self.shown,
            exclude: self.exclude,
        }
    }
}

/// Persisted group: `{name, filters}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GroupDef {
    pub name: String,
    #[serde(default)]
    pub filters: Vec<FilterDef>,
}

/// Persisted project: `{name, groups}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectDef {
    pub name: String,
    #[serde(default)]
    pub groups: Vec<GroupDef>,
}

/// On-disk layout of a project file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct ProjectFile {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selected: Option<String>,
    #[serde(default)]
    pub projects: Vec<ProjectDef>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct GroupId(pub u64);

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What a sidebar command acts on, resolved once at the boundary
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Target {
    Group(GroupId),
    Filter(FilterId),
}

impl FromStr for Target {
    type Err = FilterError;

    /// Parse `group:<id>` or `filter:<id>`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = || FilterError::InvalidTarget(s.to_string());
        let (kind, id) = s.split_once(':').ok_or_else(invalid)?;
        let id: u64 = id.trim().parse().map_err(|_| invalid())?;
        match kind.trim().to_lowercase().as_str() {
            "group" | "g" => Ok(Target::Group(GroupId(id))),
            "filter" | "f" => Ok(Target::Filter(FilterId(id))),
            _ => Err(invalid()),
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Group(id) => write!(f, "group:{id}"),
            Target::Filter(id) => write!(f, "filter:{id}"),
        }
    }
}

/// Named, ordered membership list of filters
///
/// `highlighted` and `shown` only record the last bulk toggle; they are
/// broadcast onto members when set and never consulted afterwards.
#[derive(Debug, Clone)]
pub struct Group {
    pub id: GroupId,
    pub name: String,
    pub filters: Vec<FilterId>,
    pub highlighted: bool,
    pub shown: bool,
}

#[derive(Debug)]
pub struct Project {
    name: String,
    filters: IndexMap<FilterId, Filter>,
    groups: Vec<Group>,
    colors: ColorAllocator,
    config: EngineConfig,
    next_id: u64,
}

impl Project {
    pub fn new(name: impl Into<String>, config: &EngineConfig) -> Self {
        Self {
            name: name.into(),
            filters: IndexMap::new(),
            groups: Vec::new(),
            colors: ColorAllocator::new(),
            config: config.clone(),
            next_id: 1,
        }
    }

    /// Rebuild a project from its persisted shape. Any invalid pattern
    /// rejects the whole definition.
    pub fn from_def(def: &ProjectDef, config: &EngineConfig) -> Result<Self, FilterError> {
        let mut project = Self::new(def.name.clone(), config);
        for group_def in &def.groups {
            let group = project.add_group(group_def.name.clone());
            for filter_def in &group_def.filters {
                project.add_filter_def(group, filter_def)?;
            }
        }
        Ok(project)
    }

    pub fn to_def(&self) -> ProjectDef {
        ProjectDef {
            name: self.name.clone(),
            groups: self
                .groups
                .iter()
                .map(|group| GroupDef {
                    name: group.name.clone(),
                    filters: group
                        .filters
                        .iter()
                        .filter_map(|id| self.filters.get(id))
                        .map(|filter| {
                            let flags = filter.flags();
                            FilterDef {
                                pattern: filter.pattern().to_string(),
                                color: Some(filter.color()),
                                highlighted: flags.highlighted,
                                shown: flags.shown,
                                exclude: flags.exclude,
                            }
                        })
                        .collect(),
                })
                .collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    fn next_id(&mut self) -> u64 {
        let id = self.next_id;
        self.next_id += 1;
        id
    }

    pub fn add_group(&mut self, name: impl Into<String>) -> GroupId {
        let id = GroupId(self.next_id());
        self.groups.push(Group {
            id,
            name: name.into(),
            filters: Vec::new(),
            highlighted: true,
            shown: true,
        });
        id
    }

    /// Add a filter with default flags and the next allocated color
    pub fn add_filter(&mut self, group: GroupId, pattern: &str) -> Result<FilterId, FilterError> {
        self.add_filter_def(group, &FilterDef::new(pattern))
    }

    pub fn add_filter_def(
        &mut self,
        group: GroupId,
        def: &FilterDef,
    ) -> Result<FilterId, FilterError> {
        let group_index = self.group_index(group)?;
        // The allocator only advances once the filter is accepted.
        let mut colors = self.colors.clone();
        let color = match def.color {
            Some(color) => {
                colors = ColorAllocator::starting_after(color);
                color
            }
            None => colors.next_color(),
        };
        let id = FilterId(self.next_id);
        let filter = Filter::new(id, &def.pattern, color, def.flags(), &self.config)?;
        self.colors = colors;
        self.next_id += 1;

        self.filters.insert(id, filter);
        self.groups[group_index].filters.push(id);
        tracing::debug!(project = %self.name, filter = %id, pattern = %def.pattern, "filter added");
        Ok(id)
    }

    pub fn filter(&self, id: FilterId) -> Option<&Filter> {
        self.filters.get(&id)
    }

    pub fn filter_mut(&mut self, id: FilterId) -> Result<&mut Filter, FilterError> {
        self.filters
            .get_mut(&id)
            .ok_or_else(|| FilterError::UnknownFilter(id.to_string()))
    }

    /// Filters in group order
    pub fn filters(&self) -> impl Iterator<Item = &Filter> {
        self.groups
            .iter()
            .flat_map(|group| group.filters.iter())
            .filter_map(|id| self.filters.get(id))
    }

    /// Filters in group order, mutably
    pub fn filters_mut(&mut self) -> impl Iterator<Item = &mut Filter> {
        let order: Vec<FilterId> = self
            .groups
            .iter()
            .flat_map(|group| group.filters.iter().copied())
            .collect();
        let mut by_id: IndexMap<FilterId, &mut Filter> = self
            .filters
            .iter_mut()
            .map(|(id, filter)| (*id, filter))
            .collect();
        order
            .into_iter()
            .filter_map(move |id| by_id.swap_remove(&id))
    }

    pub fn groups(&self) -> &[Group] {
        &self.groups
    }

    pub fn group(&self, id: GroupId) -> Option<&Group> {
        self.groups.iter().find(|group| group.id == id)
    }

    fn group_index(&self, id: GroupId) -> Result<usize, FilterError> {
        self.groups
            .iter()
            .position(|group| group.id == id)
            .ok_or_else(|| FilterError::UnknownGroup(id.to_string()))
    }

    pub fn set_pattern(&mut self, id: FilterId, pattern: &str) -> Result<(), FilterError> {
        self.filter_mut(id)?.set_pattern(pattern)
    }

    pub fn set_exclude(&mut self, id: FilterId, exclude: bool) -> Result<bool, FilterError> {
        Ok(self.filter_mut(id)?.set_exclude(exclude))
    }

    /// Toggle highlighting on one filter, or broadcast it to a whole group
    pub fn set_highlighted(&mut self, target: Target, value: bool) -> Result<(), FilterError> {
        match target {
            Target::Filter(id) => {
                self.filter_mut(id)?.set_highlighted(value);
            }
            Target::Group(id) => {
                let index = self.group_index(id)?;
                self.groups[index].highlighted = value;
                for member in self.groups[index].filters.clone() {
                    if let Some(filter) = self.filters.get_mut(&member) {
                        filter.set_highlighted(value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Toggle focus-view participation on one filter, or broadcast it to a
    /// whole group
    pub fn set_shown(&mut self, target: Target, value: bool) -> Result<(), FilterError> {
        match target {
            Target::Filter(id) => {
                self.filter_mut(id)?.set_shown(value);
            }
            Target::Group(id) => {
                let index = self.group_index(id)?;
                self.groups[index].shown = value;
                for member in self.groups[index].filters.clone() {
                    if let Some(filter) = self.filters.get_mut(&member) {
                        filter.set_shown(value);
                    }
                }
            }
        }
        Ok(())
    }

    /// Delete a filter or a group with all its filters, disposing them
    pub fn remove(&mut self, target: Target) -> Result<(), FilterError> {
        match target {
            Target::Filter(id) => {
                let filter = self
                    .filters
                    .shift_remove(&id)
                    .ok_or_else(|| FilterError::UnknownFilter(id.to_string()))?;
                for group in &mut self.groups {
                    group.filters.retain(|member| *member != id);
                }
                filter.dispose();
            }
            Target::Group(id) => {
                let index = self.group_index(id)?;
                let group = self.groups.remove(index);
                for member in group.filters {
                    if let Some(filter) = self.filters.shift_remove(&member) {
                        filter.dispose();
                    }
                }
            }
        }
        Ok(())
    }

    /// Drop cached results of a closed document from every filter
    pub fn document_closed(&mut self, document_id: &str) {
        for filter in self.filters.values_mut() {
            filter.forget_document(document_id);
        }
    }

    /// Dispose every filter and group
    pub fn dispose(mut self) {
        tracing::debug!(project = %self.name, filters = self.filters.len(), "project disposed");
        for (_, filter) in self.filters.drain(..) {
            filter.dispose();
        }
        self.groups.clear();
    }
}

/// All projects plus the current selection
#[derive(Debug)]
pub struct Workspace {
    projects: IndexMap<String, Project>,
    selected: Option<String>,
    config: EngineConfig,
}

impl Workspace {
    pub fn new(config: &EngineConfig) -> Self {
        Self {
            projects: IndexMap::new(),
            selected: None,
            config: config.clone(),
        }
    }

    /// Rebuild every project of a project file; the file's selection wins,
    /// else the first project is selected
    pub fn from_file(file: &ProjectFile, config: &EngineConfig) -> Result<Self, FilterError> {
        let mut workspace = Self::new(config);
        for def in &file.projects {
            if workspace.projects.contains_key(&def.name) {
                return Err(FilterError::DuplicateProject(def.name.clone()));
            }
            let project = Project::from_def(def, config)?;
            workspace.projects.insert(def.name.clone(), project);
        }

        match &file.selected {
            Some(name) => workspace.select(name)?,
            None => workspace.selected = workspace.projects.keys().next().cloned(),
        }
        Ok(workspace)
    }

    pub fn to_file(&self) -> ProjectFile {
        ProjectFile {
            selected: self.selected.clone(),
            projects: self.projects.values().map(Project::to_def).collect(),
        }
    }

    pub fn add_project(&mut self, name: &str) -> Result<&mut Project, FilterError> {
        if self.projects.contains_key(name) {
            return Err(FilterError::DuplicateProject(name.to_string()));
        }
        let project = self
            .projects
            .entry(name.to_string())
            .or_insert_with(|| Project::new(name, &self.config));
        Ok(project)
    }

    pub fn remove_project(&mut self, name: &str) -> Result<(), FilterError> {
        let project = self
            .projects
            .shift_remove(name)
            .ok_or_else(|| FilterError::UnknownProject(name.to_string()))?;
        if self.selected.as_deref() == Some(name) {
            self.selected = None;
        }
        project.dispose();
        Ok(())
    }

    pub fn select(&mut self, name: &str) -> Result<(), FilterError> {
        if !self.projects.contains_key(name) {
            return Err(FilterError::UnknownProject(name.to_string()));
        }
        tracing::debug!(project = name, "project selected");
        self.selected = Some(name.to_string());
        Ok(())
    }

    pub fn selected(&self) -> Option<&Project> {
        self.selected
            .as_deref()
            .and_then(|name| self.projects.get(name))
    }

    pub fn selected_mut(&mut self) -> Option<&mut Project> {
        match self.selected.as_deref() {
            Some(name) => self.projects.get_mut(name),
            None => None,
        }
    }

    pub fn project(&self, name: &str) -> Option<&Project> {
        self.projects.get(name)
    }

    pub fn project_names(&self) -> impl Iterator<Item = &str> {
        self.projects.keys().map(String::as_str)
    }

    /// Drop cached results of a closed document in every project
    pub fn document_closed(&mut self, document_id: &str) {
        for project in self.projects.values_mut() {
            project.document_closed(document_id);
        }
    }
}
